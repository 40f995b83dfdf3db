use crate::constants::*;
use crate::models::{Counters, ElementRecord, OutputTable, Row};

/// Which output tables the caller asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Selection {
    pub steps: bool,
    pub workouts: bool,
}

impl Selection {
    pub fn is_empty(&self) -> bool {
        !self.steps && !self.workouts
    }

    pub fn wants(&self, table: OutputTable) -> bool {
        match table {
            OutputTable::Steps => self.steps,
            OutputTable::Workouts => self.workouts,
        }
    }
}

/// A row classified into exactly one output table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Projection {
    pub table: OutputTable,
    pub row: Row,
}

/// Classifies one element and projects it into a row when it matches an enabled rule.
///
/// The decision uses only the element's own tag and attributes. Every
/// `Record` element bumps `counters.records` whatever its type, even when the
/// steps table is disabled, so a workouts-only run still reports progress.
/// This differs from counting Records only while steps are being extracted.
/// Matched rows bump the counter of their table.
pub fn classify(
    record: &ElementRecord,
    selection: Selection,
    counters: &mut Counters,
) -> Option<Projection> {
    match record.tag.as_str() {
        RECORD_TAG => {
            counters.records += 1;
            if selection.steps && record.attr("type") == STEP_COUNT_TYPE {
                counters.steps += 1;
                Some(Projection {
                    table: OutputTable::Steps,
                    row: record.project(STEPS_ATTRIBUTES),
                })
            } else {
                None
            }
        }
        WORKOUT_TAG if selection.workouts => {
            counters.workouts += 1;
            let mut row = record.project(WORKOUTS_ATTRIBUTES);
            if let Some(activity) = row.0.first_mut() {
                *activity = strip_activity_prefix(activity).to_string();
            }
            Some(Projection {
                table: OutputTable::Workouts,
                row,
            })
        }
        _ => None,
    }
}

/// `HKWorkoutActivityTypeRunning` -> `Running`; anything else passes through.
pub fn strip_activity_prefix(activity: &str) -> &str {
    activity
        .strip_prefix(ACTIVITY_TYPE_PREFIX)
        .unwrap_or(activity)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: Selection = Selection {
        steps: true,
        workouts: true,
    };

    fn step_record() -> ElementRecord {
        ElementRecord::new("Record")
            .with_attr("type", STEP_COUNT_TYPE)
            .with_attr("startDate", "2024-01-01 08:00:00 +0100")
            .with_attr("endDate", "2024-01-01 08:05:00 +0100")
            .with_attr("value", "312")
            .with_attr("unit", "count")
            .with_attr("sourceName", "iPhone")
    }

    #[test]
    fn step_record_projects_into_steps() {
        let mut counters = Counters::default();
        let projection = classify(&step_record(), ALL, &mut counters).unwrap();
        assert_eq!(projection.table, OutputTable::Steps);
        assert_eq!(
            projection.row.fields(),
            &[
                "2024-01-01 08:00:00 +0100",
                "2024-01-01 08:05:00 +0100",
                "312",
                "count",
                "iPhone"
            ]
        );
        assert_eq!(counters.records, 1);
        assert_eq!(counters.steps, 1);
    }

    #[test]
    fn other_record_types_are_counted_and_discarded() {
        let mut counters = Counters::default();
        let record = ElementRecord::new("Record").with_attr("type", "HKQuantityTypeIdentifierHeartRate");
        assert!(classify(&record, ALL, &mut counters).is_none());
        assert_eq!(counters.records, 1);
        assert_eq!(counters.steps, 0);
    }

    #[test]
    fn records_are_counted_when_steps_disabled() {
        let mut counters = Counters::default();
        let selection = Selection {
            steps: false,
            workouts: true,
        };
        assert!(classify(&step_record(), selection, &mut counters).is_none());
        assert_eq!(counters.records, 1);
        assert_eq!(counters.steps, 0);
    }

    #[test]
    fn missing_step_attributes_become_empty_fields() {
        let mut counters = Counters::default();
        let record = ElementRecord::new("Record").with_attr("type", STEP_COUNT_TYPE);
        let projection = classify(&record, ALL, &mut counters).unwrap();
        assert_eq!(projection.row.len(), STEPS_HEADER.len());
        assert!(projection.row.fields().iter().all(String::is_empty));
    }

    #[test]
    fn workout_projects_with_prefix_stripped() {
        let mut counters = Counters::default();
        let record = ElementRecord::new("Workout")
            .with_attr("workoutActivityType", "HKWorkoutActivityTypeRunning")
            .with_attr("duration", "31.5")
            .with_attr("totalDistance", "5.2")
            .with_attr("totalDistanceUnit", "km")
            .with_attr("totalEnergyBurnedUnit", "kcal");
        let projection = classify(&record, ALL, &mut counters).unwrap();
        assert_eq!(projection.table, OutputTable::Workouts);
        assert_eq!(
            projection.row.fields(),
            &["Running", "", "", "31.5", "5.2", "", "", "km", "kcal"]
        );
        assert_eq!(counters.workouts, 1);
        assert_eq!(counters.records, 0);
    }

    #[test]
    fn workouts_disabled_are_discarded_uncounted() {
        let mut counters = Counters::default();
        let selection = Selection {
            steps: true,
            workouts: false,
        };
        let record = ElementRecord::new("Workout").with_attr("workoutActivityType", "Other");
        assert!(classify(&record, selection, &mut counters).is_none());
        assert_eq!(counters, Counters::default());
    }

    #[test]
    fn unrelated_elements_are_ignored() {
        let mut counters = Counters::default();
        let record = ElementRecord::new("MetadataEntry").with_attr("type", STEP_COUNT_TYPE);
        assert!(classify(&record, ALL, &mut counters).is_none());
        assert_eq!(counters, Counters::default());
    }

    #[test]
    fn strip_activity_prefix_cases() {
        assert_eq!(strip_activity_prefix("HKWorkoutActivityTypeRunning"), "Running");
        assert_eq!(strip_activity_prefix("Other"), "Other");
        assert_eq!(strip_activity_prefix(""), "");
        // only a leading prefix is removed
        assert_eq!(
            strip_activity_prefix("CustomHKWorkoutActivityTypeYoga"),
            "CustomHKWorkoutActivityTypeYoga"
        );
    }

    #[test]
    fn absent_activity_type_stays_empty() {
        let mut counters = Counters::default();
        let record = ElementRecord::new("Workout");
        let projection = classify(&record, ALL, &mut counters).unwrap();
        assert_eq!(projection.row.fields()[0], "");
        assert_eq!(projection.row.len(), WORKOUTS_HEADER.len());
    }

    #[test]
    fn selection_helpers() {
        assert!(Selection::default().is_empty());
        assert!(!ALL.is_empty());
        assert!(ALL.wants(OutputTable::Steps));
        let steps_only = Selection {
            steps: true,
            workouts: false,
        };
        assert!(!steps_only.wants(OutputTable::Workouts));
    }
}
