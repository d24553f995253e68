// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! A declarative macro for strongly-typed flag sets.
//!
//! Generated types are plain `Copy` wrappers around an integer with the usual
//! set operations, a readable `Debug` output and a transparent serde encoding
//! (the raw bits), so flag sets can live inside serializable descriptors.

#[doc(hidden)]
pub use serde as __serde;

/// Defines a bitflag set type.
#[macro_export]
macro_rules! lattice_bitflags {
    (
        $(#[$attr:meta])*
        $vis:vis struct $name:ident: $ty:ty {
            $(
                $(#[$flag_attr:meta])*
                const $flag_name:ident = $flag_value:expr;
            )*
        }
    ) => {
        $(#[$attr])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
        $vis struct $name {
            bits: $ty,
        }

        impl $name {
            /// An empty set of flags.
            pub const EMPTY: Self = Self { bits: 0 };

            $(
                $(#[$flag_attr])*
                pub const $flag_name: Self = Self { bits: $flag_value };
            )*

            /// Creates a flag set from raw bits. Unknown bits are kept.
            pub const fn from_bits_truncate(bits: $ty) -> Self {
                Self { bits }
            }

            /// Returns the raw value of the set.
            pub const fn bits(&self) -> $ty {
                self.bits
            }

            /// Returns `true` if no flag is set.
            pub const fn is_empty(&self) -> bool {
                self.bits == 0
            }

            /// Returns `true` if all flags in `other` are set in `self`.
            pub const fn contains(&self, other: Self) -> bool {
                (self.bits & other.bits) == other.bits
            }

            /// Returns `true` if `self` and `other` share at least one flag.
            pub const fn intersects(&self, other: Self) -> bool {
                (self.bits & other.bits) != 0
            }

            /// Sets the flags in `other`.
            pub fn insert(&mut self, other: Self) {
                self.bits |= other.bits;
            }

            /// Clears the flags in `other`.
            pub fn remove(&mut self, other: Self) {
                self.bits &= !other.bits;
            }

            /// Returns a copy with `other` set.
            #[must_use]
            pub const fn with(mut self, other: Self) -> Self {
                self.bits |= other.bits;
                self
            }

            /// Returns a copy with `other` cleared.
            #[must_use]
            pub const fn without(mut self, other: Self) -> Self {
                self.bits &= !other.bits;
                self
            }
        }

        impl core::ops::BitOr for $name {
            type Output = Self;
            fn bitor(self, other: Self) -> Self {
                Self { bits: self.bits | other.bits }
            }
        }

        impl core::ops::BitAnd for $name {
            type Output = Self;
            fn bitand(self, other: Self) -> Self {
                Self { bits: self.bits & other.bits }
            }
        }

        impl core::ops::Not for $name {
            type Output = Self;
            fn not(self) -> Self {
                Self { bits: !self.bits }
            }
        }

        impl core::ops::BitOrAssign for $name {
            fn bitor_assign(&mut self, other: Self) {
                self.bits |= other.bits;
            }
        }

        impl core::ops::BitAndAssign for $name {
            fn bitand_assign(&mut self, other: Self) {
                self.bits &= other.bits;
            }
        }

        impl core::fmt::Debug for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                let mut bits = self.bits;
                let mut first_flag = true;

                write!(f, "{} {{ ", stringify!($name))?;

                $(
                    if ($flag_value != 0) && (bits & $flag_value) == $flag_value {
                        if !first_flag {
                            write!(f, " | ")?;
                        }
                        write!(f, "{}", stringify!($flag_name))?;
                        bits &= !$flag_value;
                        first_flag = false;
                    }
                )*

                if bits != 0 {
                    if !first_flag {
                        write!(f, " | ")?;
                    }
                    write!(f, "UNKNOWN({:#x})", bits)?;
                    first_flag = false;
                }

                if first_flag {
                    write!(f, "EMPTY")?;
                }

                write!(f, " }}")
            }
        }

        impl $crate::utils::bitflags::__serde::Serialize for $name {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: $crate::utils::bitflags::__serde::Serializer,
            {
                $crate::utils::bitflags::__serde::Serialize::serialize(&self.bits, serializer)
            }
        }

        impl<'de> $crate::utils::bitflags::__serde::Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: $crate::utils::bitflags::__serde::Deserializer<'de>,
            {
                <$ty as $crate::utils::bitflags::__serde::Deserialize<'de>>::deserialize(deserializer)
                    .map(Self::from_bits_truncate)
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use crate::lattice_bitflags;

    lattice_bitflags! {
        /// Flags used to exercise the macro.
        pub struct TestFlags: u32 {
            const A = 1 << 0;
            const B = 1 << 1;
            const C = 1 << 2;
            const AC = Self::A.bits() | Self::C.bits();
        }
    }

    #[test]
    fn test_set_operations() {
        let mut flags = TestFlags::A | TestFlags::B;
        assert!(flags.contains(TestFlags::A));
        assert!(!flags.contains(TestFlags::AC));
        assert!(flags.intersects(TestFlags::AC));

        flags.remove(TestFlags::A);
        assert_eq!(flags, TestFlags::B);
        flags.insert(TestFlags::C);
        assert_eq!(flags.bits(), 0b110);
        assert_eq!(flags.without(TestFlags::B), TestFlags::C);
        assert!(TestFlags::EMPTY.is_empty());
        assert!((TestFlags::A & TestFlags::B).is_empty());
    }

    #[test]
    fn test_debug_output() {
        assert_eq!(format!("{:?}", TestFlags::EMPTY), "TestFlags { EMPTY }");
        assert_eq!(format!("{:?}", TestFlags::AC), "TestFlags { A | C }");
        assert_eq!(
            format!("{:?}", TestFlags::from_bits_truncate(0b1_0010)),
            "TestFlags { B | UNKNOWN(0x10) }"
        );
    }

    #[test]
    fn test_serde_uses_raw_bits() {
        let json = serde_json::to_string(&TestFlags::AC).unwrap();
        assert_eq!(json, "5");
        let back: TestFlags = serde_json::from_str(&json).unwrap();
        assert_eq!(back, TestFlags::AC);
    }
}
