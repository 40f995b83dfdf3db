// Source document markers
pub const RECORD_TAG: &str = "Record";
pub const WORKOUT_TAG: &str = "Workout";
pub const STEP_COUNT_TYPE: &str = "HKQuantityTypeIdentifierStepCount";
pub const ACTIVITY_TYPE_PREFIX: &str = "HKWorkoutActivityType";

// Output table headers. Column names and order are a contract with downstream loaders.
pub const STEPS_HEADER: &[&str] = &["startDate", "endDate", "value", "unit", "sourceName"];
pub const WORKOUTS_HEADER: &[&str] = &[
    "activityType",
    "startDate",
    "endDate",
    "duration",
    "distance",
    "energy",
    "sourceName",
    "distanceUnit",
    "energyUnit",
];

// Source attributes projected into each table, in header order
pub const STEPS_ATTRIBUTES: &[&str] = &["startDate", "endDate", "value", "unit", "sourceName"];
pub const WORKOUTS_ATTRIBUTES: &[&str] = &[
    "workoutActivityType",
    "startDate",
    "endDate",
    "duration",
    "totalDistance",
    "totalEnergyBurned",
    "sourceName",
    "totalDistanceUnit",
    "totalEnergyBurnedUnit",
];

// Defaults
pub const DEFAULT_OUT_DIR: &str = ".";
pub const DEFAULT_STEPS_FILE: &str = "steps.csv";
pub const DEFAULT_WORKOUTS_FILE: &str = "workouts.csv";
pub const DEFAULT_PROGRESS_EVERY: u64 = 250_000;

/// Filename suffix that selects the gzip sink (and gzip source) variant.
pub const GZIP_SUFFIX: &str = ".gz";
