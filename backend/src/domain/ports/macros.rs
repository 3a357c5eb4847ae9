//! `define_port_error!`: error enums for driven ports.
//!
//! Each variant gets a `thiserror` message and a snake_case constructor whose
//! parameters take `impl Into<T>`, so adapters can write
//! `PaymentGatewayError::timeout("deadline elapsed")`.

macro_rules! define_port_error {
    (
        $(#[$outer:meta])*
        pub enum $name:ident {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident $( { $($field:ident : $ty:ty),* $(,)? } )? => $message:expr
            ),* $(,)?
        }
    ) => {
        $(#[$outer])*
        #[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
        pub enum $name {
            $(
                $(#[$variant_meta])*
                #[error($message)]
                $variant $( { $($field : $ty),* } )?,
            )*
        }

        impl $name {
            $(
                define_port_error!(@constructor $variant $( { $($field : $ty),* } )?);
            )*
        }
    };

    (@constructor $variant:ident) => {
        ::paste::paste! {
            #[must_use]
            pub fn [<$variant:snake>]() -> Self {
                Self::$variant
            }
        }
    };

    (@constructor $variant:ident { $($field:ident : $ty:ty),* }) => {
        ::paste::paste! {
            #[must_use]
            pub fn [<$variant:snake>]($($field: impl Into<$ty>),*) -> Self {
                Self::$variant { $($field: $field.into()),* }
            }
        }
    };
}

pub(crate) use define_port_error;

#[cfg(test)]
mod tests {
    define_port_error! {
        pub enum LedgerError {
            Closed => "ledger closed",
            Unreachable { message: String } => "ledger unreachable: {message}",
            Refused { status: u16, message: String } => "ledger refused ({status}): {message}",
        }
    }

    #[test]
    fn unit_variants_get_nullary_constructors() {
        assert_eq!(LedgerError::closed(), LedgerError::Closed);
        assert_eq!(LedgerError::closed().to_string(), "ledger closed");
    }

    #[test]
    fn string_fields_take_borrowed_text() {
        let err = LedgerError::unreachable("connection reset");
        assert_eq!(err.to_string(), "ledger unreachable: connection reset");
    }

    #[test]
    fn mixed_fields_keep_declaration_order() {
        let err = LedgerError::refused(429_u16, String::from("slow down"));
        assert_eq!(
            err,
            LedgerError::Refused {
                status: 429,
                message: "slow down".to_owned(),
            }
        );
        assert_eq!(err.to_string(), "ledger refused (429): slow down");
    }
}
