use std::collections::HashMap;

use approx::assert_relative_eq;
use showerreco_algorithms::{
    rms_shower_gradient, shower_centre, ChargeCentroidEstimator, ChargeConfig,
};
use showerreco_core::{
    CandidateError, DetectorProperties, Hit, SignalType, SpacePoint, SpacePointId, Vector3,
    WireId,
};

/// Four points per unit step along +z, spreading out with z.
fn cone(steps: u32) -> (Vec<SpacePoint>, HashMap<SpacePointId, Vec<Hit>>) {
    let mut space_points = Vec::new();
    let mut associations = HashMap::new();
    let mut id = 0_u64;
    for step in 0..steps {
        let z = f64::from(step);
        let width = 0.5 + 0.3 * z;
        for (x, y) in [(width, 0.0), (-width, 0.0), (0.0, width), (0.0, -width)] {
            let sp = SpacePoint::new(id, x, y, z);
            let hits: Vec<Hit> = (0..3)
                .map(|plane| {
                    let wire = WireId::new(0, plane, step);
                    let hit = Hit::new(3 * id + u64::from(plane), wire, 400.0, 50.0);
                    if plane == 2 {
                        hit
                    } else {
                        hit.with_signal_type(SignalType::Induction)
                    }
                })
                .collect();
            associations.insert(sp.id, hits);
            space_points.push(sp);
            id += 1;
        }
    }
    (space_points, associations)
}

#[test]
fn test_centroid_then_direction_check() {
    let (mut space_points, associations) = cone(10);
    let detector = DetectorProperties::default();
    let estimator = ChargeCentroidEstimator::new(&detector, ChargeConfig::default());

    let centroid = estimator
        .shower_centre(&space_points, &associations)
        .unwrap();
    let geometric = shower_centre(&space_points).unwrap();
    assert_relative_eq!(centroid.position.x, geometric.x, epsilon = 1e-9);
    assert_relative_eq!(centroid.position.y, geometric.y, epsilon = 1e-9);
    assert_relative_eq!(centroid.position.z, 4.5, epsilon = 1e-9);

    let per_point = 50.0 * detector.lifetime_correction(400.0);
    assert_relative_eq!(centroid.total_charge, 40.0 * per_point, epsilon = 1e-6);

    let forward =
        rms_shower_gradient(&mut space_points, &centroid.position, &Vector3::z(), 4).unwrap();
    let backward =
        rms_shower_gradient(&mut space_points, &centroid.position, &-Vector3::z(), 4).unwrap();
    assert!(forward > 0.0, "forward gradient {forward}");
    assert!(backward < 0.0, "backward gradient {backward}");
}

#[test]
fn test_collection_only_charge() {
    let (space_points, associations) = cone(3);
    let detector = DetectorProperties::default();
    let estimator = ChargeCentroidEstimator::new(
        &detector,
        ChargeConfig::default().with_use_collection_only(true),
    );
    let centroid = estimator
        .shower_centre(&space_points, &associations)
        .unwrap();
    assert_relative_eq!(
        centroid.total_charge,
        12.0 * 50.0 * detector.lifetime_correction(400.0),
        epsilon = 1e-6
    );
}

#[test]
fn test_centroid_without_charge() {
    let (space_points, _) = cone(3);
    let detector = DetectorProperties::default();
    let estimator = ChargeCentroidEstimator::new(&detector, ChargeConfig::default());
    let no_hits: HashMap<SpacePointId, Vec<Hit>> = HashMap::new();

    assert_eq!(
        estimator.shower_centre(&space_points, &no_hits),
        Err(CandidateError::ZeroTotalCharge)
    );
    assert_eq!(
        estimator.shower_centre(&[], &no_hits),
        Err(CandidateError::ZeroTotalCharge)
    );
}

#[cfg(feature = "serde")]
mod config_loading {
    use showerreco_algorithms::{ChargeConfig, DedxConfig, DedxLabels};

    #[test]
    fn test_partial_dedx_config() {
        let config: DedxConfig =
            serde_json::from_str(r#"{"dedx_cut": 4.0, "use_median": false}"#).unwrap();
        assert!((config.dedx_cut - 4.0).abs() < f64::EPSILON);
        assert!(!config.use_median);
        assert!((config.max_dist - DedxConfig::default().max_dist).abs() < f64::EPSILON);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_labels_override() {
        let labels: DedxLabels =
            serde_json::from_str(r#"{"shower_dedx_output": "ElectronCandidatedEdx"}"#).unwrap();
        assert_eq!(labels.shower_dedx_output, "ElectronCandidatedEdx");
        assert_eq!(labels.initial_track_input, "InitialTrack");
    }

    #[test]
    fn test_config_round_trip() {
        let config = ChargeConfig::default().with_use_collection_only(true);
        let json = serde_json::to_string(&config).unwrap();
        let back: ChargeConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }
}
