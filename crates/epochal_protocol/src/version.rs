use std::fmt;

use crate::types::VarInt;

/// Protocol version numbers for the Minecraft releases this crate speaks.
///
/// Only the first release of each epoch is listed; releases sharing a protocol
/// number (1.16.5 and 1.16.4, 1.20.1 and 1.20, ...) map to the same constant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProtocolVersion(i32);

macro_rules! protocol_versions {
    ($($name:ident = $number:literal => $label:literal),* $(,)?) => {
        impl ProtocolVersion {
            $(
                #[doc = concat!("Protocol version for Minecraft ", $label)]
                pub const $name: ProtocolVersion = ProtocolVersion($number);
            )*

            /// Every supported epoch, oldest first.
            pub const SUPPORTED: &'static [ProtocolVersion] = &[$(ProtocolVersion::$name),*];

            /// Returns the version name (e.g., "1.18.2")
            pub fn name(&self) -> &'static str {
                match self.0 {
                    $($number => $label,)*
                    _ => "Unknown Version",
                }
            }
        }
    };
}

protocol_versions! {
    V1_7_2 = 4 => "1.7.2",
    V1_7_6 = 5 => "1.7.6",
    V1_8 = 47 => "1.8",
    V1_9 = 107 => "1.9",
    V1_9_1 = 108 => "1.9.1",
    V1_9_2 = 109 => "1.9.2",
    V1_9_4 = 110 => "1.9.4",
    V1_10 = 210 => "1.10",
    V1_11 = 315 => "1.11",
    V1_11_1 = 316 => "1.11.1",
    V1_12 = 335 => "1.12",
    V1_12_1 = 338 => "1.12.1",
    V1_12_2 = 340 => "1.12.2",
    V1_13 = 393 => "1.13",
    V1_13_1 = 401 => "1.13.1",
    V1_13_2 = 404 => "1.13.2",
    V1_14 = 477 => "1.14",
    V1_14_1 = 480 => "1.14.1",
    V1_14_2 = 485 => "1.14.2",
    V1_14_3 = 490 => "1.14.3",
    V1_14_4 = 498 => "1.14.4",
    V1_15 = 573 => "1.15",
    V1_15_1 = 575 => "1.15.1",
    V1_15_2 = 578 => "1.15.2",
    V1_16 = 735 => "1.16",
    V1_16_1 = 736 => "1.16.1",
    V1_16_2 = 751 => "1.16.2",
    V1_16_3 = 753 => "1.16.3",
    V1_16_4 = 754 => "1.16.4",
    V1_17 = 755 => "1.17",
    V1_17_1 = 756 => "1.17.1",
    V1_18 = 757 => "1.18",
    V1_18_2 = 758 => "1.18.2",
    V1_19 = 759 => "1.19",
    V1_19_1 = 760 => "1.19.1",
    V1_19_3 = 761 => "1.19.3",
    V1_19_4 = 762 => "1.19.4",
    V1_20 = 763 => "1.20",
    V1_20_2 = 764 => "1.20.2",
    V1_20_3 = 765 => "1.20.3",
    V1_20_5 = 766 => "1.20.5",
    V1_21 = 767 => "1.21",
    V1_21_2 = 768 => "1.21.2",
    V1_21_4 = 769 => "1.21.4",
    V1_21_5 = 770 => "1.21.5",
}

impl ProtocolVersion {
    pub const OLDEST: ProtocolVersion = ProtocolVersion::V1_7_2;
    pub const LATEST: ProtocolVersion = ProtocolVersion::V1_21_5;

    /// Creates a new ProtocolVersion from a protocol number
    pub const fn new(protocol: i32) -> Self {
        ProtocolVersion(protocol)
    }

    /// Returns the protocol number
    pub const fn protocol_number(&self) -> i32 {
        self.0
    }

    /// Whether this number is one of the listed epochs.
    pub fn is_known(&self) -> bool {
        Self::SUPPORTED.binary_search(self).is_ok()
    }

    /// Whether logins pass through the configuration phase before play.
    pub fn has_configuration_phase(&self) -> bool {
        *self >= ProtocolVersion::V1_20_2
    }

    pub fn to_varint(&self) -> VarInt {
        VarInt(self.0)
    }
}

impl From<i32> for ProtocolVersion {
    fn from(protocol: i32) -> Self {
        ProtocolVersion(protocol)
    }
}

impl From<ProtocolVersion> for i32 {
    fn from(version: ProtocolVersion) -> Self {
        version.0
    }
}

impl fmt::Display for ProtocolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_known() {
            write!(f, "{} ({})", self.name(), self.0)
        } else {
            write!(f, "{}", self.0)
        }
    }
}
