//! Helper macro generating port error enums with snake-case constructors.
//!
//! Each variant becomes a `thiserror` variant plus a constructor named after
//! it, taking `impl Into<_>` for every field in declaration order, so
//! adapters can write `TransportError::timeout("deadline elapsed")`.

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

        ::paste::paste! {
            impl $name {
                $(
                    #[doc = "Build [`" $name "::" $variant "`]."]
                    pub fn [<$variant:snake>]($($($field: impl Into<$ty>),*)?) -> Self {
                        Self::$variant $( { $($field: $field.into()),* } )?
                    }
                )*
            }
        }
    };
}

pub(crate) use define_port_error;

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use rstest::rstest;

    define_port_error! {
        pub enum DispatchError {
            Refused { host: String } => "connection refused by {host}",
            Throttled { retry_after: u32 } => "throttled for {retry_after}s",
            Redirected { location: String, hops: u8 } => "redirected to {location} after {hops} hops",
            Closed => "connection closed",
        }
    }

    #[rstest]
    #[case(DispatchError::refused("api.example.test"), "connection refused by api.example.test")]
    #[case(DispatchError::throttled(30_u32), "throttled for 30s")]
    #[case(DispatchError::redirected("/login", 3_u8), "redirected to /login after 3 hops")]
    #[case(DispatchError::closed(), "connection closed")]
    fn constructors_render_their_messages(#[case] err: DispatchError, #[case] expected: &str) {
        assert_eq!(err.to_string(), expected);
    }

    #[rstest]
    fn constructors_convert_each_field() {
        assert_eq!(
            DispatchError::redirected(String::from("/login"), 2_u8),
            DispatchError::Redirected {
                location: "/login".to_owned(),
                hops: 2,
            }
        );
        assert_eq!(
            DispatchError::throttled(30_u32),
            DispatchError::Throttled { retry_after: 30 }
        );
    }
}
