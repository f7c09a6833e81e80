//! Rule-based alarm evaluation over detector output.

use argus_models::{DetectedObject, DetectedPerson};

/// Labels that raise an alarm when detected with sufficient confidence.
pub const ALARM_LABELS: &[&str] = &["fire", "knife", "gun", "person_falling"];

/// Confidence must be strictly greater than this to alarm.
pub const ALARM_CONFIDENCE_FLOOR: f32 = 0.5;

/// Alarm appended when a person-shaped object is seen but no face resolves.
pub const FACE_NOT_VISIBLE_ALARM: &str = "Person detected but face not visible";

/// Per-object alarm rule.
///
/// An object whose label is in [`ALARM_LABELS`] with confidence strictly
/// above [`ALARM_CONFIDENCE_FLOOR`] contributes one `"Detected {label}"`
/// string. Detection order is preserved and duplicates are kept.
pub fn object_alarms(objects: &[DetectedObject]) -> Vec<String> {
    objects
        .iter()
        .filter(|obj| {
            ALARM_LABELS.contains(&obj.label.as_str()) && obj.confidence > ALARM_CONFIDENCE_FLOOR
        })
        .map(|obj| format!("Detected {}", obj.label))
        .collect()
}

/// Cross-detector rule, evaluated once after both detectors complete.
///
/// If any object is labeled `"person"` and no face was located, append
/// [`FACE_NOT_VISIBLE_ALARM`] after the per-object alarms. This covers a
/// back-turned or occluded person as well as an unavailable face runtime.
pub fn apply_face_visibility_rule(
    objects: &[DetectedObject],
    people: &[DetectedPerson],
    alarms: &mut Vec<String>,
) {
    if people.is_empty() && objects.iter().any(|obj| obj.label == "person") {
        alarms.push(FACE_NOT_VISIBLE_ALARM.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use argus_models::BoundingBox;

    fn object(label: &str, confidence: f32) -> DetectedObject {
        DetectedObject {
            label: label.to_string(),
            confidence,
            bbox: BoundingBox::new(0.0, 0.0, 10.0, 10.0),
        }
    }

    fn person_face() -> DetectedPerson {
        DetectedPerson {
            bbox: BoundingBox::new(0.0, 0.0, 10.0, 10.0),
            confidence: 1.0,
            embedding: vec![0.0; 128],
        }
    }

    #[test]
    fn test_alarm_label_above_floor() {
        let alarms = object_alarms(&[object("fire", 0.51)]);
        assert_eq!(alarms, vec!["Detected fire"]);
    }

    #[test]
    fn test_confidence_boundary_is_strict() {
        assert!(object_alarms(&[object("knife", 0.5)]).is_empty());
        assert_eq!(object_alarms(&[object("knife", 0.500001)]).len(), 1);
    }

    #[test]
    fn test_non_alarm_label_ignored() {
        assert!(object_alarms(&[object("cat", 0.99)]).is_empty());
    }

    #[test]
    fn test_order_preserved_and_duplicates_kept() {
        let alarms = object_alarms(&[
            object("gun", 0.9),
            object("fire", 0.8),
            object("gun", 0.7),
        ]);
        assert_eq!(alarms, vec!["Detected gun", "Detected fire", "Detected gun"]);
    }

    #[test]
    fn test_face_rule_fires_once_after_object_alarms() {
        let objects = vec![object("person", 0.9), object("person", 0.8), object("fire", 0.9)];
        let mut alarms = object_alarms(&objects);
        apply_face_visibility_rule(&objects, &[], &mut alarms);
        assert_eq!(alarms, vec!["Detected fire", FACE_NOT_VISIBLE_ALARM]);
    }

    #[test]
    fn test_face_rule_absent_when_face_found() {
        let objects = vec![object("person", 0.9)];
        let mut alarms = Vec::new();
        apply_face_visibility_rule(&objects, &[person_face()], &mut alarms);
        assert!(alarms.is_empty());
    }

    #[test]
    fn test_face_rule_absent_without_person() {
        let objects = vec![object("car", 0.9)];
        let mut alarms = Vec::new();
        apply_face_visibility_rule(&objects, &[], &mut alarms);
        assert!(alarms.is_empty());
    }
}
