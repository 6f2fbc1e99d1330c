//! Tests of address validation, the configuration, and [`Synced`].

use rstest::*;

use prologix::{ControllerConfig, ControllerError, GpibAddress, GpibTerm, Setting, Synced};

#[rstest]
#[case(0, true)]
#[case(1, true)]
#[case(15, true)]
#[case(30, true)]
#[case(31, false)]
#[case(96, false)]
#[case(126, false)]
#[case(131, false)]
fn test_primary_address_valid(#[case] addr: u8, #[case] valid: bool) {
    assert_eq!(GpibAddress::try_new(addr, None).is_ok(), valid);
}

#[rstest]
#[case(0, false)]
#[case(30, false)]
#[case(95, false)]
#[case(96, true)]
#[case(126, true)]
#[case(127, false)]
#[case(131, false)]
fn test_secondary_address_valid(#[case] addr: u8, #[case] valid: bool) {
    assert_eq!(GpibAddress::try_new(0, Some(addr)).is_ok(), valid);
}

#[rstest]
fn test_address_display() {
    assert_eq!(GpibAddress::try_new(5, None).unwrap().to_string(), "5");
    assert_eq!(GpibAddress::try_new(5, Some(96)).unwrap().to_string(), "5 96");
}

#[rstest]
fn test_config_defaults() {
    let cfg = ControllerConfig::new(10);
    assert_eq!(cfg.primary_address, 10);
    assert_eq!(cfg.secondary_address, None);
    assert!(!cfg.clear_on_init);
    assert_eq!(cfg.read_timeout_ms, 500);
    assert!(!cfg.auto_read);
    assert!(cfg.assert_eoi);
    assert_eq!(cfg.gpib_termination, GpibTerm::AppendCrLf);
    assert_eq!(cfg.eot_char, b'\n');
    assert_eq!(cfg.transport_terminator, b'\n');
}

#[rstest]
#[case(1, true)]
#[case(3000, true)]
#[case(0, false)]
#[case(3001, false)]
fn test_config_read_timeout(#[case] timeout: u32, #[case] valid: bool) {
    let cfg = ControllerConfig {
        read_timeout_ms: timeout,
        ..ControllerConfig::default()
    };
    assert_eq!(cfg.validate().is_ok(), valid);
}

#[rstest]
fn test_synced_confirmed() {
    let synced = Synced::Confirmed(true);
    assert!(!synced.is_corrected());
    assert!(*synced.value());
    assert!(synced.into_result().unwrap());
}

#[rstest]
fn test_synced_corrected() {
    let synced = Synced::Corrected {
        setting: Setting::GpibTermination,
        cached: GpibTerm::AppendCrLf,
        actual: GpibTerm::AppendNothing,
    };
    assert!(synced.is_corrected());
    assert_eq!(*synced.value(), GpibTerm::AppendNothing);

    let err = synced.into_result().unwrap_err();
    assert!(matches!(err, ControllerError::InternalStateMismatch { .. }));
    assert!(err.to_string().contains("GPIB termination"));
}
