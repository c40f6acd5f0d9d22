//! Patient-facing advice for each triage level.

use crate::model::TriageLevel;
use serde::Serialize;

/// What a patient is told after classification.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct TriageGuidance {
    /// Short badge text used in clinician views.
    pub label: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub next_steps: [&'static str; 4],
}

const GREEN: TriageGuidance = TriageGuidance {
    label: "Self-care",
    title: "Self-Care Recommended",
    description: "Based on your symptoms, this does not appear to require urgent medical attention. You can likely manage this at home with self-care.",
    next_steps: [
        "Rest and stay hydrated",
        "Use over-the-counter medication if appropriate",
        "Monitor your symptoms over the next 48 hours",
        "Contact your GP if symptoms worsen or persist beyond a week",
    ],
};

const AMBER: TriageGuidance = TriageGuidance {
    label: "GP Review",
    title: "GP Consultation Recommended",
    description: "Your symptoms suggest you should see a GP at your earliest convenience. This is not an emergency, but professional evaluation is advisable.",
    next_steps: [
        "Book an appointment with your GP this week",
        "Note down any changes in your symptoms",
        "Bring a list of current medications to your appointment",
        "If symptoms worsen significantly, consider attending an urgent care centre",
    ],
};

const RED: TriageGuidance = TriageGuidance {
    label: "Urgent",
    title: "Urgent Care Advised",
    description: "Your symptoms indicate you should seek prompt medical attention. Please contact your GP urgently or attend an urgent care centre / A&E today.",
    next_steps: [
        "Contact your GP for an urgent appointment",
        "If unavailable, attend your nearest urgent care centre",
        "For life-threatening symptoms, call 999 / 112 immediately",
        "Do not drive yourself if you feel unwell – ask someone to take you",
    ],
};

impl TriageLevel {
    pub fn guidance(&self) -> &'static TriageGuidance {
        match self {
            TriageLevel::Green => &GREEN,
            TriageLevel::Amber => &AMBER,
            TriageLevel::Red => &RED,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_match_clinician_badges() {
        assert_eq!(TriageLevel::Green.guidance().label, "Self-care");
        assert_eq!(TriageLevel::Amber.guidance().label, "GP Review");
        assert_eq!(TriageLevel::Red.guidance().label, "Urgent");
    }

    #[test]
    fn red_guidance_mentions_emergency_numbers() {
        assert!(TriageLevel::Red
            .guidance()
            .next_steps
            .iter()
            .any(|step| step.contains("999 / 112")));
    }
}
