/// Derives [`LuaType`](crate::LuaType) and [`FormatValue`](crate::FormatValue)
/// for a type implementing [`LuaRecord`](crate::LuaRecord).
///
/// The record's type name, and so its default file name, is the last path
/// segment of the type as written.
#[macro_export]
macro_rules! lua_record {
    ($ty:ty) => {
        impl $crate::LuaType for $ty {
            fn type_name() -> &'static str {
                $crate::registry::simple_name(stringify!($ty))
            }

            fn kind() -> ::std::result::Result<$crate::Kind, $crate::DecodeError> {
                $crate::Kind::record::<Self>()
            }

            fn from_decoded(
                decoded: $crate::Decoded,
            ) -> ::std::result::Result<Self, $crate::DecodeError> {
                $crate::descriptor::lift_record::<Self>(decoded)
            }
        }

        impl $crate::FormatValue for $ty {
            fn fmt_value(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                $crate::format::fmt_record(self, f)
            }
        }
    };
}

/// Implements [`LuaType`](crate::LuaType) and [`FormatValue`](crate::FormatValue)
/// for a fieldless enum, decoded from its case names.
///
/// ```
/// #[derive(Debug, PartialEq)]
/// enum Mode {
///     Fast,
///     Safe,
/// }
///
/// luaconfig::lua_enum!(Mode { Fast, Safe });
///
/// let mode: Mode = luaconfig::decode_as(&luaconfig::Value::from("safe")).unwrap();
/// assert_eq!(mode, Mode::Safe);
/// ```
#[macro_export]
macro_rules! lua_enum {
    ($ty:ident { $($case:ident),+ $(,)? }) => {
        impl $crate::LuaType for $ty {
            fn type_name() -> &'static str {
                stringify!($ty)
            }

            fn kind() -> ::std::result::Result<$crate::Kind, $crate::DecodeError> {
                $crate::Kind::enumeration::<Self>(&[$(stringify!($case)),+])
            }

            fn from_decoded(
                decoded: $crate::Decoded,
            ) -> ::std::result::Result<Self, $crate::DecodeError> {
                match decoded.into_enum()? {
                    $(stringify!($case) => Ok($ty::$case),)+
                    other => Err($crate::DecodeError::custom(format!(
                        "'{}' is not a case of {}",
                        other,
                        stringify!($ty)
                    ))),
                }
            }
        }

        impl $crate::FormatValue for $ty {
            fn fmt_value(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                match self {
                    $($ty::$case => f.write_str(stringify!($case)),)+
                }
            }
        }
    };
}
