use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;

use super::{Kind, LuaType, Primitive};
use crate::decode::{Decoded, DecodeError};

macro_rules! primitive_type {
    ($ty:ty, $kind:ident) => {
        impl LuaType for $ty {
            fn kind() -> Result<Kind, DecodeError> {
                Ok(Kind::Primitive(Primitive::$kind))
            }

            fn from_decoded(decoded: Decoded) -> Result<Self, DecodeError> {
                match decoded {
                    Decoded::$kind(value) => Ok(value),
                    other => Err(other.inconsistent(stringify!($kind))),
                }
            }
        }
    };
}

primitive_type!(i32, Int);
primitive_type!(bool, Bool);
primitive_type!(i16, Short);
primitive_type!(String, Str);
primitive_type!(i64, Long);

/// Same kind as `T`; an absent field leaves `None`.
impl<T: LuaType> LuaType for Option<T> {
    fn kind() -> Result<Kind, DecodeError> {
        T::kind()
    }

    fn from_decoded(decoded: Decoded) -> Result<Self, DecodeError> {
        T::from_decoded(decoded).map(Some)
    }
}

impl<T: LuaType> LuaType for Vec<T> {
    fn kind() -> Result<Kind, DecodeError> {
        Kind::sequence::<T>()
    }

    fn from_decoded(decoded: Decoded) -> Result<Self, DecodeError> {
        match decoded {
            Decoded::Sequence(items) => items.into_iter().map(T::from_decoded).collect(),
            other => Err(other.inconsistent("Sequence")),
        }
    }
}

impl<K, V> LuaType for HashMap<K, V>
where
    K: LuaType + Eq + Hash,
    V: LuaType,
{
    fn kind() -> Result<Kind, DecodeError> {
        Kind::mapping::<K, V>()
    }

    fn from_decoded(decoded: Decoded) -> Result<Self, DecodeError> {
        let mut map = HashMap::new();
        for (key, value) in mapping_pairs(decoded)? {
            map.insert(K::from_decoded(key)?, V::from_decoded(value)?);
        }
        Ok(map)
    }
}

impl<K, V> LuaType for BTreeMap<K, V>
where
    K: LuaType + Ord,
    V: LuaType,
{
    fn kind() -> Result<Kind, DecodeError> {
        Kind::mapping::<K, V>()
    }

    fn from_decoded(decoded: Decoded) -> Result<Self, DecodeError> {
        let mut map = BTreeMap::new();
        for (key, value) in mapping_pairs(decoded)? {
            map.insert(K::from_decoded(key)?, V::from_decoded(value)?);
        }
        Ok(map)
    }
}

fn mapping_pairs(decoded: Decoded) -> Result<Vec<(Decoded, Decoded)>, DecodeError> {
    match decoded {
        Decoded::Mapping(pairs) => Ok(pairs),
        other => Err(other.inconsistent("Mapping")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lift_rejects_mismatched_tree() {
        let err = i32::from_decoded(Decoded::Str("1".into())).unwrap_err();
        assert_eq!(err.to_string(), "decoded Str where Int was described");

        let err = Vec::<i32>::from_decoded(Decoded::Int(1)).unwrap_err();
        assert_eq!(err.to_string(), "decoded Int where Sequence was described");
    }

    #[test]
    fn test_option_wraps_inner() {
        assert_eq!(
            Option::<String>::from_decoded(Decoded::Str("x".into())).unwrap(),
            Some("x".to_string())
        );
    }
}
