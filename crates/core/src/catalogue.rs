//! Body areas offered on the symptom form and the symptoms commonly reported for each.
//!
//! The catalogue only drives suggestions: reports may name any body area or symptom.

/// Body areas in form order, each with its common symptoms.
pub const BODY_AREAS: &[(&str, &[&str])] = &[
    ("Head / Face", &["Headache", "Dizziness", "Migraine", "Jaw pain"]),
    ("Eyes", &["Blurred vision", "Eye pain", "Red eye", "Itchy eyes"]),
    (
        "Ears / Nose / Throat",
        &[
            "Sore throat",
            "Earache",
            "Blocked nose",
            "Nosebleed",
            "Difficulty swallowing",
        ],
    ),
    (
        "Chest / Lungs",
        &["Cough", "Shortness of breath", "Wheezing", "Chest tightness"],
    ),
    (
        "Heart / Cardiovascular",
        &[
            "Chest pain",
            "Palpitations",
            "Swollen ankles",
            "High blood pressure",
        ],
    ),
    (
        "Abdomen / Stomach",
        &[
            "Nausea",
            "Vomiting",
            "Diarrhoea",
            "Constipation",
            "Stomach cramps",
            "Bloating",
        ],
    ),
    (
        "Back / Spine",
        &["Lower back pain", "Upper back pain", "Neck pain", "Stiffness"],
    ),
    ("Skin", &["Rash", "Itching", "Swelling", "Bruising", "Wound"]),
    (
        "Arms / Hands",
        &["Joint pain", "Numbness", "Weakness", "Swelling"],
    ),
    (
        "Legs / Feet",
        &["Leg pain", "Swollen legs", "Numbness", "Cramps"],
    ),
    (
        "Urinary / Reproductive",
        &[
            "Painful urination",
            "Frequent urination",
            "Blood in urine",
            "Pelvic pain",
        ],
    ),
    (
        "Mental Health",
        &["Anxiety", "Low mood", "Insomnia", "Stress", "Fatigue"],
    ),
    (
        "General / Whole Body",
        &[
            "Fever",
            "Fatigue",
            "Weight loss",
            "Night sweats",
            "Loss of appetite",
        ],
    ),
];

/// Common symptoms for a body area, matched case-insensitively. Empty for unknown areas.
pub fn common_symptoms(area: &str) -> &'static [&'static str] {
    let area = area.trim();
    BODY_AREAS
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(area))
        .map(|(_, symptoms)| *symptoms)
        .unwrap_or(&[])
}

/// De-duplicated symptom suggestions across several body areas, in catalogue order.
pub fn suggestions_for<'a>(areas: impl IntoIterator<Item = &'a str>) -> Vec<&'static str> {
    let mut out: Vec<&'static str> = Vec::new();
    for area in areas {
        for symptom in common_symptoms(area) {
            if !out.contains(symptom) {
                out.push(*symptom);
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_ignores_case_and_padding() {
        assert_eq!(common_symptoms(" skin "), &["Rash", "Itching", "Swelling", "Bruising", "Wound"]);
        assert!(common_symptoms("Elbow").is_empty());
    }

    #[test]
    fn suggestions_are_deduplicated_across_areas() {
        let suggestions = suggestions_for(["Mental Health", "General / Whole Body"]);
        assert_eq!(
            suggestions.iter().filter(|s| **s == "Fatigue").count(),
            1,
            "fatigue appears under both areas"
        );
        assert_eq!(suggestions.first(), Some(&"Anxiety"));
    }
}
