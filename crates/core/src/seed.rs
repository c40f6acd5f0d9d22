//! Demo caseload.
//!
//! Demo cases are ordinary submissions: they go through intake and classification like any
//! patient report, and the ones shown as already reviewed receive a real `review` action.

use crate::error::TriageResult;
use crate::ids::PatientId;
use crate::model::report::SymptomReport;
use crate::model::submission::Submission;
use crate::model::ActionType;
use crate::workflow::WorkflowEngine;

struct DemoCase {
    patient_id: &'static str,
    first_name: &'static str,
    last_name: &'static str,
    age: i64,
    gender: &'static str,
    body_area: &'static str,
    symptoms: &'static [&'static str],
    duration: &'static str,
    severity: i64,
    additional_info: &'static str,
    reviewed: bool,
}

const DEMO_CASES: &[DemoCase] = &[
    DemoCase {
        patient_id: "P-1001",
        first_name: "Aoife",
        last_name: "Murphy",
        age: 34,
        gender: "Female",
        body_area: "Chest / Lungs",
        symptoms: &["Cough", "Shortness of breath", "Chest tightness"],
        duration: "4 – 7 days",
        severity: 3,
        additional_info: "History of asthma. The cough is worse at night and the inhaler is needed more often than usual.",
        reviewed: false,
    },
    DemoCase {
        patient_id: "P-1002",
        first_name: "Seán",
        last_name: "O'Connor",
        age: 52,
        gender: "Male",
        body_area: "Heart / Cardiovascular",
        symptoms: &["Chest pain", "Palpitations", "Shortness of breath"],
        duration: "Less than 24 hours",
        severity: 4,
        additional_info: "Woke at 3am with chest pain radiating into the left arm. Palpitations remain. Family history of heart disease.",
        reviewed: false,
    },
    DemoCase {
        patient_id: "P-1003",
        first_name: "Ciara",
        last_name: "Byrne",
        age: 27,
        gender: "Female",
        body_area: "Skin",
        symptoms: &["Rash", "Itching"],
        duration: "1 – 3 days",
        severity: 1,
        additional_info: "Small red rash on the forearm after switching laundry detergent. Mildly itchy, no pain.",
        reviewed: true,
    },
    DemoCase {
        patient_id: "P-1004",
        first_name: "Patrick",
        last_name: "Gallagher",
        age: 68,
        gender: "Male",
        body_area: "Abdomen / Stomach",
        symptoms: &["Stomach cramps", "Bloating", "Constipation"],
        duration: "More than 2 weeks",
        severity: 2,
        additional_info: "Bloating and irregular bowel habits for three weeks. Some unintentional weight loss. No blood in stool.",
        reviewed: false,
    },
    DemoCase {
        patient_id: "P-1005",
        first_name: "Niamh",
        last_name: "Doyle",
        age: 41,
        gender: "Female",
        body_area: "Mental Health",
        symptoms: &["Anxiety", "Insomnia", "Low mood", "Fatigue"],
        duration: "1 – 2 weeks",
        severity: 3,
        additional_info: "Work stress has increased. Waking at 4am for the past two weeks and unable to get back to sleep.",
        reviewed: false,
    },
    DemoCase {
        patient_id: "P-1006",
        first_name: "Rory",
        last_name: "Walsh",
        age: 8,
        gender: "Male",
        body_area: "Ears / Nose / Throat",
        symptoms: &["Sore throat", "Blocked nose"],
        duration: "1 – 3 days",
        severity: 1,
        additional_info: "Submitted by parent. Runny nose and sore throat since yesterday, temperature 37.8°C. Eating and drinking normally.",
        reviewed: true,
    },
];

impl DemoCase {
    fn report(&self) -> SymptomReport {
        SymptomReport {
            first_name: self.first_name.into(),
            last_name: self.last_name.into(),
            age: Some(self.age),
            gender: self.gender.into(),
            body_areas: vec![self.body_area.into()],
            symptoms: self.symptoms.iter().map(|s| s.to_string()).collect(),
            duration: self.duration.into(),
            severity: Some(self.severity),
            additional_info: self.additional_info.into(),
        }
    }
}

/// Loads the demo caseload into `engine` and returns the created submissions in their final
/// state.
pub fn seed_demo(engine: &WorkflowEngine) -> TriageResult<Vec<Submission>> {
    let mut seeded = Vec::with_capacity(DEMO_CASES.len());
    for case in DEMO_CASES {
        let patient_id = PatientId::parse(case.patient_id)?;
        let submission = engine.create_submission(Some(patient_id), &case.report())?;
        if case.reviewed {
            engine.record_action(
                submission.id.clone(),
                None,
                ActionType::Review,
                Some("Reviewed during demo setup".into()),
            )?;
        }
        seeded.push(engine.get_submission(&submission.id)?);
    }
    tracing::info!(count = seeded.len(), "demo caseload seeded");
    Ok(seeded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{SubmissionStatus, TriageLevel};

    #[test]
    fn test_seed_demo_classifies_every_case() {
        let engine = WorkflowEngine::in_memory();
        let seeded = seed_demo(&engine).expect("demo data is valid");

        let levels: Vec<_> = seeded.iter().map(|s| s.triage_level).collect();
        assert_eq!(
            levels,
            vec![
                TriageLevel::Amber,
                TriageLevel::Red,
                TriageLevel::Green,
                TriageLevel::Amber,
                TriageLevel::Amber,
                TriageLevel::Green,
            ]
        );
    }

    #[test]
    fn test_seed_demo_reviews_through_actions() {
        let engine = WorkflowEngine::in_memory();
        let seeded = seed_demo(&engine).unwrap();

        let reviewed: Vec<_> = seeded
            .iter()
            .filter(|s| s.status == SubmissionStatus::Reviewed)
            .map(|s| s.first_name.as_str())
            .collect();
        assert_eq!(reviewed, vec!["Ciara", "Rory"]);

        for submission in &seeded {
            let actions = engine.list_actions(&submission.id).unwrap();
            assert_eq!(actions.len(), usize::from(!submission.is_pending_review()));
        }
        assert_eq!(engine.summary(None).unwrap().total, 6);
    }
}
