macro_rules! enum_builder {
    (
        $(#[$m:meta])*
        @U16
        $enum_vis:vis enum $enum_name:ident
        { $( $(#[$enum_meta:meta])* $enum_var: ident => ($enum_val: literal, $enum_str: literal) ),* $(,)? }
    ) => {
        $(#[$m])*
        #[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy)]
        $enum_vis enum $enum_name {
            $(
                $(#[$enum_meta])*
                $enum_var
            ),*
            ,Unknown(u16)
        }

        impl $enum_name {
            /// Human readable name, `None` for unknown codes.
            pub fn name(&self) -> Option<&'static str> {
                match self {
                    $( $enum_name::$enum_var => Some($enum_str), )*
                    $enum_name::Unknown(_) => None,
                }
            }

            /// The wire code.
            pub fn code(&self) -> u16 {
                match self {
                    $( $enum_name::$enum_var => $enum_val, )*
                    $enum_name::Unknown(x) => *x,
                }
            }
        }

        impl From<u16> for $enum_name {
            fn from(x: u16) -> Self {
                match x {
                    $($enum_val => $enum_name::$enum_var),*
                    , x => $enum_name::Unknown(x),
                }
            }
        }

        impl ::std::fmt::Display for $enum_name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                match self {
                    $( $enum_name::$enum_var => f.write_str($enum_str), )*
                    $enum_name::Unknown(x) => if x & 0x0f0f == 0x0a0a && (x >> 8) == (x & 0xff) {
                        write!(f, "GREASE ({x:#06x})")
                    } else {
                        write!(f, "Unknown ({x:#06x})")
                    }
                }
            }
        }

        impl ::serde::Serialize for $enum_name {
            #[inline]
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: ::serde::Serializer,
            {
                serializer.collect_str(self)
            }
        }
    };
}
