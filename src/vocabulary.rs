//! C1: Muscle Vocabulary & Normalizer.
//!
//! Holds the closed set of canonical muscle labels plus the alias table
//! and equipment-category keyword table used to resolve free-text names
//! coming out of logs and LLM output into vocabulary members. The label
//! strings themselves are carried over verbatim from the catalog's
//! actual vocabulary data; they are closed-set reference data, not
//! translated prose.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// A canonical muscle label: a member of [`MUSCLE_LABELS`]. Constructing
/// one outside this module always goes through [`Normalize`], so a
/// `MuscleLabel` in hand is always vocabulary-valid.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MuscleLabel(String);

impl MuscleLabel {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True if `s` is already a vocabulary member.
    pub fn is_canonical(s: &str) -> bool {
        MUSCLE_LABELS.contains(&s)
    }
}

impl fmt::Display for MuscleLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for MuscleLabel {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// The closed vocabulary. Order is the catalog's native order and is
/// preserved wherever the vocabulary itself is enumerated (e.g. in
/// prompt templates).
pub static MUSCLE_LABELS: &[&str] = &[
    "가로돌기사이근", "가시사이근", "가시아래근", "가시윗근", "가자미근", "가쪽넓은근", "궁둥구멍근",
    "긴모음근", "긴목근", "긴발가락폄근", "긴엄지발가락폄근", "넓은등근", "넙다리곧은근",
    "넙다리근막긴장근", "넙다리네갈래근", "넙다리두갈래근", "넙다리빗근", "노쪽 손목 폄근",
    "노쪽손목굽힘근", "돌림근", "두덩정강근", "뒤넙다리근", "뒤세모근", "뒤정강근", "등가시근",
    "등세모근", "마름모근", "머리가장긴근", "머리널판근", "머리반가시근", "모음근", "목/머리널판근",
    "목빗근", "뭇갈래근", "바깥갈비사이근", "반막모양근", "반힘줄모양근", "배가로근", "배곧은근",
    "배바깥빗근", "배빗근", "배속빗근", "볼기근", "손목굽힘근", "손목폄근", "안쪽갈비사이근",
    "안쪽넓은근", "앞세모근", "앞정강근", "앞톱니근", "어깨밑근", "어깨세모근", "어깨올림근",
    "엉덩관절굽힘근", "엉덩근", "엉덩허리근", "위팔근", "위팔노근", "위팔두갈래근", "위팔세갈래근",
    "작은가슴근", "작은볼기근", "작은원근", "장딴지근", "장딴지세갈래근", "중간볼기근",
    "중간어깨세모근", "짧은 모음근", "척추세움근", "큰가슴근", "큰볼기근", "큰원근", "큰허리근",
    "허리근", "허리네모근", "허리엉덩갈비근",
];

/// Free-text name → first-matching canonical labels. Looked up both as
/// an exact-key match and, during keyword matching, via substring
/// containment on the key.
fn muscle_aliases() -> &'static [(&'static str, &'static [&'static str])] {
    &[
        ("어깨근육", &["어깨세모근", "어깨올림근", "어깨밑근", "중간어깨세모근"]),
        ("어깨", &["어깨세모근", "어깨올림근", "어깨밑근"]),
        ("팔근육", &["위팔두갈래근", "위팔세갈래근", "위팔근", "위팔노근"]),
        ("팔", &["위팔두갈래근", "위팔세갈래근", "위팔근"]),
        ("삼두", &["위팔세갈래근"]),
        ("이두", &["위팔두갈래근"]),
        ("복근", &["배곧은근", "배가로근", "배바깥빗근", "배속빗근"]),
        ("복부", &["배곧은근", "배가로근"]),
        ("코어", &["배곧은근", "배가로근", "허리근"]),
        ("종아리근육", &["장딴지근", "장딴지세갈래근", "뒤정강근"]),
        ("종아리", &["장딴지근", "장딴지세갈래근"]),
        ("볼기근", &["큰볼기근", "중간볼기근", "작은볼기근"]),
        ("둔근", &["큰볼기근", "중간볼기근", "작은볼기근"]),
        ("가슴", &["큰가슴근", "작은가슴근"]),
        ("등", &["넓은등근", "등세모근", "등가시근"]),
        ("하체", &["넙다리네갈래근", "넙다리두갈래근", "뒤넙다리근", "큰볼기근", "중간볼기근", "작은볼기근"]),
        ("허벅지", &["넙다리네갈래근", "넙다리두갈래근", "뒤넙다리근"]),
        ("대퇴", &["넙다리네갈래근", "넙다리두갈래근"]),
        ("허리", &["큰허리근", "허리근", "허리네모근"]),
    ]
}

/// `Normalize(names) → labels`: exact match, then alias table, then
/// bidirectional substring match against the vocabulary, then keyword
/// match over the alias table's keys. Duplicates removed, first-seen
/// order preserved. Unresolvable names are dropped silently.
pub fn normalize<I, S>(names: I) -> Vec<MuscleLabel>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let aliases = muscle_aliases();
    let mut out = Vec::new();

    for raw in names {
        let muscle = raw.as_ref().trim();
        if muscle.is_empty() {
            continue;
        }

        // (a) exact match
        if MuscleLabel::is_canonical(muscle) {
            out.push(MuscleLabel(muscle.to_string()));
            continue;
        }

        // (b) alias table, exact key
        if let Some((_, mapped)) = aliases.iter().find(|(k, _)| *k == muscle) {
            if let Some(first) = mapped.first() {
                out.push(MuscleLabel(first.to_string()));
            }
            continue;
        }

        // (c) bidirectional substring match against the vocabulary
        let mut found = false;
        for label in MUSCLE_LABELS {
            if muscle.contains(label) || label.contains(muscle) {
                out.push(MuscleLabel(label.to_string()));
                found = true;
                break;
            }
        }
        if found {
            continue;
        }

        // (d) keyword match over the alias table's keys
        let muscle_lower = muscle.to_lowercase();
        for (key, mapped) in aliases {
            if muscle_lower.contains(&key.to_lowercase()) || key.to_lowercase().contains(&muscle_lower) {
                if let Some(first) = mapped.first() {
                    out.push(MuscleLabel(first.to_string()));
                }
                break;
            }
        }
        // else: unresolvable, dropped silently
    }

    dedup_preserve_order(out)
}

fn dedup_preserve_order(items: Vec<MuscleLabel>) -> Vec<MuscleLabel> {
    let mut seen = HashSet::new();
    let mut result = Vec::with_capacity(items.len());
    for item in items {
        if seen.insert(item.0.clone()) {
            result.push(item);
        }
    }
    result
}

/// `ExpandAliases(label)`: all canonical labels "related" to `label`,
/// used by C3's broadened matching pass. Always includes `label`
/// itself.
pub fn expand_aliases(label: &MuscleLabel) -> Vec<MuscleLabel> {
    let muscle = label.as_str();
    let mut aliases: HashSet<String> = HashSet::new();
    aliases.insert(muscle.to_string());

    if let Some((_, mapped)) = muscle_aliases().iter().find(|(k, _)| *k == muscle) {
        for m in *mapped {
            aliases.insert(m.to_string());
        }
    }

    for candidate in MUSCLE_LABELS {
        if muscle.contains(candidate) || candidate.contains(&muscle) {
            aliases.insert(candidate.to_string());
        }
    }

    aliases.into_iter().map(MuscleLabel).collect()
}

/// The closed equipment-category set (§4.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EquipmentCategory {
    Bodyweight,
    Machine,
    Dumbbell,
    Bench,
    Band,
    Ball,
    Rope,
    Step,
    Cone,
    BallGame,
    Racket,
    Hoop,
    Bike,
    Treadmill,
    Barbell,
    Plate,
    Bosu,
    Ladder,
    FoamRoller,
    Stick,
    Kettlebell,
    Line,
    Other,
}

impl fmt::Display for EquipmentCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Bodyweight => "bodyweight",
            Self::Machine => "machine",
            Self::Dumbbell => "dumbbell",
            Self::Bench => "bench",
            Self::Band => "band",
            Self::Ball => "ball",
            Self::Rope => "rope",
            Self::Step => "step",
            Self::Cone => "cone",
            Self::BallGame => "ball-game",
            Self::Racket => "racket",
            Self::Hoop => "hoop",
            Self::Bike => "bike",
            Self::Treadmill => "treadmill",
            Self::Barbell => "barbell",
            Self::Plate => "plate",
            Self::Bosu => "bosu",
            Self::Ladder => "ladder",
            Self::FoamRoller => "foam-roller",
            Self::Stick => "stick",
            Self::Kettlebell => "kettlebell",
            Self::Line => "line",
            Self::Other => "other",
        };
        write!(f, "{s}")
    }
}

/// Keyword lists driving case-insensitive substring lookup in
/// [`equipment_category`]. Two of the catalog's native categories
/// (circle wheel / pilates ring props) have no counterpart in the
/// closed set and fold into [`EquipmentCategory::Other`] — see
/// DESIGN.md.
fn equipment_keywords() -> &'static [(EquipmentCategory, &'static [&'static str])] {
    use EquipmentCategory::*;
    &[
        (Bodyweight, &["맨몸", "바디웨이트", "bodyweight", "체중", "무도구"]),
        (Machine, &["머신", "machine", "케이블", "기구", "기계", "스미스", "프레스"]),
        (Dumbbell, &["덤벨", "dumbbell"]),
        (Bench, &["의자", "chair", "벤치", "bench"]),
        (Band, &["탄력밴드", "밴드", "band", "resistance band", "튜빙"]),
        (Ball, &["짐볼", "짐 볼", "gym ball", "stability ball", "fitness ball"]),
        (Rope, &["줄넘기", "jump rope"]),
        (Step, &["스텝박스", "step box", "stepbench", "스텝 박스"]),
        (Cone, &["콘", "cone"]),
        (BallGame, &["공", "ball"]),
        (Racket, &["라켓", "racket"]),
        (Hoop, &["훌라후프", "hula hoop"]),
        (Bike, &["자전거", "cycle", "bike", "stationary bike"]),
        (Treadmill, &["트레드밀", "treadmill"]),
        (Barbell, &["바벨", "barbell"]),
        (Plate, &["원판", "plate"]),
        (Bosu, &["보수볼", "보슈볼", "bosu"]),
        (Ladder, &["사다리", "ladder"]),
        (FoamRoller, &["폼롤러", "foam roller", "foam-roller", "마사지 롤러", "스트레칭 롤러"]),
        (Stick, &["봉", "stick", "body bar", "아쿠아봉", "aqua stick"]),
        (Kettlebell, &["케틀벨", "kettlebell"]),
        (Line, &["줄", "rope trainer"]),
    ]
}

/// `EquipmentCategory(tool)`: case-insensitive keyword lookup over a
/// free-text tool string. Unknown/empty tools map to `Other`.
pub fn equipment_category(tool: &str) -> EquipmentCategory {
    let normalized = tool.trim().to_lowercase();
    if normalized.is_empty() {
        return EquipmentCategory::Other;
    }

    for (category, keywords) in equipment_keywords() {
        for keyword in *keywords {
            let keyword_lower = keyword.to_lowercase();
            if !keyword_lower.is_empty() && normalized.contains(&keyword_lower) {
                return *category;
            }
        }
    }

    EquipmentCategory::Other
}

/// All equipment-category keyword strings flattened, used by C7 to
/// check whether a query already contains an equipment signal.
pub fn all_equipment_keywords() -> HashSet<String> {
    equipment_keywords()
        .iter()
        .flat_map(|(_, kws)| kws.iter())
        .filter(|k| !k.is_empty())
        .map(|k| k.to_lowercase())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_match_passes_through() {
        let labels = normalize(["큰가슴근"]);
        assert_eq!(labels.len(), 1);
        assert_eq!(labels[0].as_str(), "큰가슴근");
    }

    #[test]
    fn alias_resolves_to_first_mapped_label() {
        let labels = normalize(["가슴"]);
        assert_eq!(labels.len(), 1);
        assert_eq!(labels[0].as_str(), "큰가슴근");
    }

    #[test]
    fn unresolvable_names_are_dropped() {
        let labels = normalize(["존재하지않는근육이름xyz123"]);
        assert!(labels.is_empty());
    }

    #[test]
    fn dedup_preserves_first_seen_order() {
        let labels = normalize(["큰가슴근", "가슴", "큰가슴근"]);
        assert_eq!(labels.len(), 1);
        assert_eq!(labels[0].as_str(), "큰가슴근");
    }

    #[test]
    fn normalize_is_idempotent() {
        let once = normalize(["가슴", "등", "어깨"]);
        let once_strs: Vec<&str> = once.iter().map(|l| l.as_str()).collect();
        let twice = normalize(once_strs);
        assert_eq!(once, twice);
    }

    #[test]
    fn expand_aliases_includes_self() {
        let base = normalize(["큰가슴근"]).remove(0);
        let expanded = expand_aliases(&base);
        assert!(expanded.iter().any(|l| l.as_str() == "큰가슴근"));
    }

    #[test]
    fn equipment_category_known_keyword() {
        assert_eq!(equipment_category("덤벨"), EquipmentCategory::Dumbbell);
        assert_eq!(equipment_category("barbell rack"), EquipmentCategory::Barbell);
    }

    #[test]
    fn equipment_category_unknown_falls_back_to_other() {
        assert_eq!(equipment_category(""), EquipmentCategory::Other);
        assert_eq!(equipment_category("써클휠"), EquipmentCategory::Other);
    }
}
