/// Implements the conversions and formatting shared by every [`Buf32`](crate::buf::Buf32)
/// newtype identifier.
#[macro_export]
macro_rules! impl_buf_wrapper {
    ($wrapper:ident) => {
        impl ::std::convert::From<$crate::buf::Buf32> for $wrapper {
            fn from(value: $crate::buf::Buf32) -> Self {
                Self(value)
            }
        }

        impl ::std::convert::From<$wrapper> for $crate::buf::Buf32 {
            fn from(value: $wrapper) -> Self {
                value.0
            }
        }

        impl ::std::convert::From<[u8; 32]> for $wrapper {
            fn from(value: [u8; 32]) -> Self {
                Self($crate::buf::Buf32::from(value))
            }
        }

        impl ::std::convert::AsRef<[u8; 32]> for $wrapper {
            fn as_ref(&self) -> &[u8; 32] {
                self.0.as_bytes()
            }
        }

        impl ::core::fmt::Debug for $wrapper {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                ::core::fmt::Debug::fmt(&self.0, f)
            }
        }

        impl ::core::fmt::Display for $wrapper {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                ::core::fmt::Display::fmt(&self.0, f)
            }
        }
    };
}
