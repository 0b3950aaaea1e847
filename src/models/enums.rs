use crate::db::DatabaseError;
use serde::{Deserialize, Serialize};

/// Macro to generate enum with as_str + std::str::FromStr pattern
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = DatabaseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(DatabaseError::InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }
    };
}

str_enum!(PatientStatus {
    Waiting => "waiting",
    Admitted => "admitted",
    Discharged => "discharged",
});

str_enum!(BedStatus {
    Empty => "empty",
    Occupied => "occupied",
    Reserved => "reserved",
    Maintenance => "maintenance",
});

str_enum!(ClinicianAvailability {
    Available => "available",
    Busy => "busy",
    OffShift => "off_shift",
});

str_enum!(AdmissionStatus {
    Active => "active",
    Discharged => "discharged",
});

str_enum!(InvoiceStatus {
    Pending => "pending",
    Paid => "paid",
    Partial => "partial",
    Waived => "waived",
});

str_enum!(NotificationKind {
    Admission => "admission",
    Discharge => "discharge",
    Settlement => "settlement",
    Alert => "alert",
});

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn bed_status_round_trip() {
        for s in ["empty", "occupied", "reserved", "maintenance"] {
            assert_eq!(BedStatus::from_str(s).unwrap().as_str(), s);
        }
    }

    #[test]
    fn invoice_status_round_trip() {
        for s in ["pending", "paid", "partial", "waived"] {
            assert_eq!(InvoiceStatus::from_str(s).unwrap().as_str(), s);
        }
    }

    #[test]
    fn unknown_value_is_invalid_enum() {
        let err = AdmissionStatus::from_str("archived").unwrap_err();
        match err {
            DatabaseError::InvalidEnum { field, value } => {
                assert_eq!(field, "AdmissionStatus");
                assert_eq!(value, "archived");
            }
            other => panic!("Expected InvalidEnum, got: {other}"),
        }
    }
}
