//! Common test utilities for integration tests

use std::fs;
use std::io::{self, Read, Write};
use std::path::Path;

/// Helper function to create a test XML file
#[allow(dead_code)]
pub fn create_test_xml_file(path: &Path, content: &str) {
    let parent = path.parent().unwrap();
    fs::create_dir_all(parent).unwrap();
    fs::File::create(path)
        .unwrap()
        .write_all(content.as_bytes())
        .unwrap();
}

/// Reads a CSV file (optionally gzip-compressed) into header + rows.
#[allow(dead_code)]
pub fn read_table(path: &Path) -> (Vec<String>, Vec<Vec<String>>) {
    let file = fs::File::open(path).unwrap();
    let input: Box<dyn Read> = if path.to_str().unwrap().ends_with(".gz") {
        Box::new(flate2::read::GzDecoder::new(file))
    } else {
        Box::new(file)
    };
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(input);
    let header = reader
        .headers()
        .unwrap()
        .iter()
        .map(str::to_string)
        .collect();
    let rows = reader
        .records()
        .map(|r| r.unwrap().iter().map(str::to_string).collect())
        .collect();
    (header, rows)
}

/// Small export shaped like a real Apple Health export.xml
#[allow(dead_code)]
pub const SAMPLE_EXPORT: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE HealthData [
<!ELEMENT HealthData (ExportDate,Me,(Record|Workout)*)>
<!ATTLIST HealthData locale CDATA #REQUIRED>
]>
<HealthData locale="en_US">
 <ExportDate value="2024-03-01 10:00:00 +0100"/>
 <Me HKCharacteristicTypeIdentifierDateOfBirth="1990-01-01"/>
 <Record type="HKQuantityTypeIdentifierStepCount" sourceName="Jane's iPhone" unit="count" creationDate="2024-01-01 09:00:00 +0100" startDate="2024-01-01 08:00:00 +0100" endDate="2024-01-01 08:10:00 +0100" value="512"/>
 <Record type="HKQuantityTypeIdentifierHeartRate" sourceName="Watch" unit="count/min" startDate="2024-01-01 08:01:00 +0100" endDate="2024-01-01 08:01:00 +0100" value="72">
  <MetadataEntry key="HKMetadataKeyHeartRateMotionContext" value="0"/>
 </Record>
 <Record type="HKQuantityTypeIdentifierStepCount" sourceName="Watch, Series 9" unit="count" startDate="2024-01-01 09:00:00 +0100" endDate="2024-01-01 09:10:00 +0100" value="87">
  <MetadataEntry key="HKTimeZone" value="Europe/Madrid"/>
 </Record>
 <Workout workoutActivityType="HKWorkoutActivityTypeRunning" duration="31.5" durationUnit="min" totalDistance="5.2" totalDistanceUnit="km" totalEnergyBurned="410" totalEnergyBurnedUnit="kcal" sourceName="Watch" startDate="2024-01-02 07:00:00 +0100" endDate="2024-01-02 07:31:30 +0100">
  <WorkoutEvent type="HKWorkoutEventTypePause" date="2024-01-02 07:10:00 +0100"/>
  <WorkoutStatistics type="HKQuantityTypeIdentifierDistanceWalkingRunning" sum="5.2" unit="km"/>
 </Workout>
 <Workout workoutActivityType="Other" duration="12" sourceName="Watch" startDate="2024-01-03 07:00:00 +0100" endDate="2024-01-03 07:12:00 +0100"/>
 <Record type="HKQuantityTypeIdentifierStepCount" startDate="2024-01-04 08:00:00 +0100" value="3"/>
</HealthData>"#;

/// Lazily generated export document; never held in memory as a whole.
///
/// Record `i` is a step count when `i` is even and a heart-rate sample
/// otherwise; every hundredth record is followed by a workout.
#[allow(dead_code)]
pub struct SyntheticExport {
    total: usize,
    next: usize,
    chunk: Vec<u8>,
    pos: usize,
    started: bool,
    footer_done: bool,
}

#[allow(dead_code)]
impl SyntheticExport {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            next: 0,
            chunk: Vec::with_capacity(512),
            pos: 0,
            started: false,
            footer_done: false,
        }
    }

    pub fn expected_steps(total: usize) -> u64 {
        total.div_ceil(2) as u64
    }

    pub fn expected_workouts(total: usize) -> u64 {
        total.div_ceil(100) as u64
    }

    fn refill(&mut self) -> bool {
        self.chunk.clear();
        self.pos = 0;

        if !self.started {
            self.started = true;
            self.chunk.extend_from_slice(
                b"<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<HealthData locale=\"en_US\">\n",
            );
            return true;
        }

        if self.next < self.total {
            let i = self.next;
            self.next += 1;
            if i % 2 == 0 {
                write!(
                    self.chunk,
                    " <Record type=\"HKQuantityTypeIdentifierStepCount\" sourceName=\"Synthetic\" unit=\"count\" startDate=\"2024-01-01 08:00:00 +0100\" endDate=\"2024-01-01 08:01:00 +0100\" value=\"{i}\"/>\n"
                )
                .unwrap();
            } else {
                write!(
                    self.chunk,
                    " <Record type=\"HKQuantityTypeIdentifierHeartRate\" sourceName=\"Synthetic\" unit=\"count/min\" value=\"{}\">\n  <MetadataEntry key=\"HKMetadataKeyHeartRateMotionContext\" value=\"0\"/>\n </Record>\n",
                    60 + i % 40
                )
                .unwrap();
            }
            if i % 100 == 0 {
                write!(
                    self.chunk,
                    " <Workout workoutActivityType=\"HKWorkoutActivityTypeWalking\" duration=\"{i}\" sourceName=\"Synthetic\">\n  <WorkoutRoute sourceName=\"Synthetic\"><FileReference path=\"/route_{i}.gpx\"/></WorkoutRoute>\n </Workout>\n"
                )
                .unwrap();
            }
            return true;
        }

        if !self.footer_done {
            self.footer_done = true;
            self.chunk.extend_from_slice(b"</HealthData>\n");
            return true;
        }

        false
    }
}

impl Read for SyntheticExport {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        while self.pos == self.chunk.len() {
            if !self.refill() {
                return Ok(0);
            }
        }
        let n = buf.len().min(self.chunk.len() - self.pos);
        buf[..n].copy_from_slice(&self.chunk[self.pos..self.pos + n]);
        self.pos += n;
        Ok(n)
    }
}
