// Layout of the recorded data file

use spent_fuel_cc::config::Orientation;
use spent_fuel_cc::recorder::COLUMN_HEADER;
use spent_fuel_cc::{Model, RunConfig};

#[test]
fn test_header_then_event_lines() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("output").join("data.txt");
    let mut config = RunConfig::default();
    config.output = output.clone();
    config.assembly.nx = 2;
    config.assembly.ny = 2;
    config.assembly.active_rods = Some(vec![1, 2]);
    config.assembly.orientation = Orientation::Horizontal;
    config.assembly.surface_distance_mm = 500.0;
    config.source.target = Some("ComptonCamera".to_string());
    config.run.seed = Some(11);

    let mut model = Model::from_config(&config).unwrap();
    let summary = model.beam_on(3000).unwrap();
    model.close().unwrap();

    let text = std::fs::read_to_string(&output).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines[0], "# active fuel rods: 2/4");
    assert_eq!(lines[1], "# 0 1 ");
    assert_eq!(lines[2], "# 1 0 ");
    assert_eq!(lines[3], COLUMN_HEADER);

    let events = &lines[4..];
    assert_eq!(events.len() as u64, summary.recorded);
    assert!(summary.recorded >= 20, "{:?}", summary);
    for line in events {
        assert!(line.ends_with('\t'));
        let fields: Vec<&str> = line[..line.len() - 1].split('\t').collect();
        let groups = (fields.len() - 2) / 6;
        assert_eq!(fields.len(), 2 + 6 * groups);
        assert!(groups == 1 || groups == 2);

        let event_id: u64 = fields[0].parse().unwrap();
        assert!(event_id < 3000);
        // C-style scientific weight
        let (mantissa, exponent) = fields[1].split_once('e').unwrap();
        assert_eq!(mantissa.len(), "1.00000".len());
        assert!(exponent.starts_with('+') || exponent.starts_with('-'));

        let mut previous = -1;
        for group in fields[2..].chunks(6) {
            let copy_no: i32 = group[0].parse().unwrap();
            assert!(copy_no > previous);
            previous = copy_no;
            assert_eq!(group[1].split_once('.').unwrap().1.len(), 1);
            assert_eq!(group[4].split_once('.').unwrap().1.len(), 3);
            let edep: f64 = group[4].parse().unwrap();
            assert!(edep > 0.0 && edep <= 0.663);
            let z: f64 = group[3].parse().unwrap();
            // camera spans z in [-60, 0]
            assert!((-60.0..=0.0).contains(&z));
        }
    }
}

#[test]
fn test_coincidence_only_output() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("coincidences.txt");
    let mut config = RunConfig::default();
    config.output = output.clone();
    config.assembly.nx = 2;
    config.assembly.ny = 2;
    config.source.target = Some("ComptonCamera".to_string());
    config.run.min_hits = 2;
    config.run.seed = Some(3);

    let mut model = Model::from_config(&config).unwrap();
    let summary = model.beam_on(3000).unwrap();
    model.close().unwrap();
    assert_eq!(summary.recorded, summary.coincidences);

    let text = std::fs::read_to_string(&output).unwrap();
    for line in text.lines().filter(|l| !l.starts_with('#')) {
        assert_eq!(line.trim_end_matches('\t').split('\t').count(), 2 + 12);
    }
}

#[test]
fn test_runs_append_to_existing_file() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("data.txt");
    std::fs::write(&output, "previous contents\n").unwrap();
    let mut config = RunConfig::default();
    config.output = output.clone();
    config.assembly.nx = 1;
    config.assembly.ny = 1;

    let mut model = Model::from_config(&config).unwrap();
    model.beam_on(10).unwrap();
    model.close().unwrap();
    let text = std::fs::read_to_string(&output).unwrap();
    assert!(text.starts_with("previous contents\n# active fuel rods: 1/1\n"));
}
