//! Unit tests for the Identifiers module
//!
//! Tests cover identifier creation, parsing, conversion, and display
//! formatting for the marketplace and payments identifiers.

use core_kernel::{
    BookingId, CustomerId, ProviderId, PaymentId, PaymentEventId,
    RefundId, PayoutId, PaymentCardId, JobId,
};
use uuid::Uuid;

mod payment_id_tests {
    use super::*;

    #[test]
    fn test_new_generates_unique_ids() {
        let id1 = PaymentId::new();
        let id2 = PaymentId::new();
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_new_v7_generates_time_ordered_ids() {
        let id1 = PaymentId::new_v7();
        std::thread::sleep(std::time::Duration::from_millis(1));
        let id2 = PaymentId::new_v7();
        let uuid1: Uuid = id1.into();
        let uuid2: Uuid = id2.into();
        assert!(uuid1 < uuid2);
    }

    #[test]
    fn test_from_uuid() {
        let uuid = Uuid::new_v4();
        let id = PaymentId::from_uuid(uuid);
        assert_eq!(*id.as_uuid(), uuid);
    }

    #[test]
    fn test_display_format_is_usable_as_gateway_reference() {
        let id = PaymentId::new();
        let display = id.to_string();
        assert!(display.starts_with("PAY-"));
        assert_eq!(display.len(), "PAY-".len() + 36);
    }

    #[test]
    fn test_from_str_with_prefix() {
        let original = PaymentId::new();
        let parsed: PaymentId = original.to_string().parse().unwrap();
        assert_eq!(original, parsed);
    }

    #[test]
    fn test_from_str_rejects_garbage() {
        assert!("PAY-not-a-uuid".parse::<PaymentId>().is_err());
    }

    #[test]
    fn test_serializes_as_bare_uuid() {
        let id = PaymentId::new();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", id.as_uuid()));
    }
}

mod prefixes {
    use super::*;

    #[test]
    fn test_all_prefixes() {
        assert_eq!(BookingId::prefix(), "BKG");
        assert_eq!(CustomerId::prefix(), "CUS");
        assert_eq!(ProviderId::prefix(), "PRV");
        assert_eq!(PaymentId::prefix(), "PAY");
        assert_eq!(PaymentEventId::prefix(), "PEV");
        assert_eq!(RefundId::prefix(), "RFD");
        assert_eq!(PayoutId::prefix(), "PYO");
        assert_eq!(PaymentCardId::prefix(), "CRD");
        assert_eq!(JobId::prefix(), "JOB");
    }

    #[test]
    fn test_payout_id_round_trip_through_display() {
        let id = PayoutId::new();
        let parsed: PayoutId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
    }
}
