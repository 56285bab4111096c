// Call code bit patterns and descriptor derivation.
//
// A call site is (descriptor, code). Codes are pure functions of declaration
// order: the caller and callee halves are generated separately and agree only
// because both apply these rules to the same model.
//
// Within a struct/interface descriptor the low byte tags the member kind and
// the upper bits carry the member's declared index:
//
//   field i getter   (i << 8) | 0x0f
//   field i setter   (i << 8) | 0x1f
//   method j         (j << 8) | 0x0c
//
// Free functions live under the package descriptor and count from 1.

/// Low-byte tag of a field getter code.
pub const FIELD_GET_TAG: i32 = 0x0f;
/// Low-byte tag of a field setter code.
pub const FIELD_SET_TAG: i32 = 0x1f;
/// Low-byte tag of a method code.
pub const METHOD_TAG: i32 = 0x0c;
/// Mask selecting the tag byte.
pub const TAG_MASK: i32 = 0xff;
/// Code of the first free function in a package.
pub const FIRST_FUNC_CODE: i32 = 1;
/// Largest member index that still fits a positive `i32` code.
pub const MAX_MEMBER_INDEX: u32 = (1 << 23) - 1;

/// Kind of member addressed by a struct/interface code.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MemberKind {
    FieldGet,
    FieldSet,
    Method,
}

const fn member_code(index: u32, tag: i32) -> Option<i32> {
    if index > MAX_MEMBER_INDEX {
        None
    } else {
        Some(((index as i32) << 8) | tag)
    }
}

/// Getter code of the field at declared position `index`.
pub const fn field_get_code(index: u32) -> Option<i32> {
    member_code(index, FIELD_GET_TAG)
}

/// Setter code of the field at declared position `index`.
pub const fn field_set_code(index: u32) -> Option<i32> {
    member_code(index, FIELD_SET_TAG)
}

/// Code of the method at declared position `index`.
pub const fn method_code(index: u32) -> Option<i32> {
    member_code(index, METHOD_TAG)
}

/// Code of the free function at declared position `index` (0-based).
pub const fn func_code(index: u32) -> Option<i32> {
    if index >= i32::MAX as u32 {
        None
    } else {
        Some(index as i32 + FIRST_FUNC_CODE)
    }
}

/// Split a member code back into (kind, declared index).
pub fn decode_member_code(code: i32) -> Option<(MemberKind, u32)> {
    if code < 0 {
        return None;
    }
    let kind = match code & TAG_MASK {
        FIELD_GET_TAG => MemberKind::FieldGet,
        FIELD_SET_TAG => MemberKind::FieldSet,
        METHOD_TAG => MemberKind::Method,
        _ => return None,
    };
    Some((kind, (code >> 8) as u32))
}

/// Descriptor of a package's free functions.
pub fn package_descriptor(package: &str) -> String {
    package.to_string()
}

/// Descriptor of a struct's or interface's members.
pub fn type_descriptor(package: &str, type_name: &str) -> String {
    format!("{package}.{type_name}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn member_codes_match_documented_layout() {
        assert_eq!(field_get_code(0), Some(0x00f));
        assert_eq!(field_set_code(0), Some(0x01f));
        assert_eq!(field_get_code(1), Some(0x10f));
        assert_eq!(field_set_code(1), Some(0x11f));
        assert_eq!(method_code(0), Some(0x00c));
        assert_eq!(method_code(1), Some(0x10c));
    }

    #[test]
    fn member_kinds_never_collide() {
        for i in 0..64u32 {
            for j in 0..64u32 {
                let get = field_get_code(i).unwrap();
                let set = field_set_code(i).unwrap();
                let m = method_code(j).unwrap();
                assert_ne!(get, m);
                assert_ne!(set, m);
                assert_ne!(get, field_set_code(j).unwrap());
            }
        }
    }

    #[test]
    fn decode_inverts_encode() {
        assert_eq!(decode_member_code(0x30f), Some((MemberKind::FieldGet, 3)));
        assert_eq!(decode_member_code(0x21f), Some((MemberKind::FieldSet, 2)));
        assert_eq!(decode_member_code(0x10c), Some((MemberKind::Method, 1)));
        assert_eq!(decode_member_code(0x105), None);
    }

    #[test]
    fn out_of_range_index_is_rejected() {
        assert!(method_code(MAX_MEMBER_INDEX).is_some());
        assert!(method_code(MAX_MEMBER_INDEX + 1).is_none());
        assert!(method_code(MAX_MEMBER_INDEX).unwrap() > 0);
    }

    #[test]
    fn func_codes_start_at_one() {
        assert_eq!(func_code(0), Some(1));
        assert_eq!(func_code(8), Some(9));
    }

    #[test]
    fn descriptors() {
        assert_eq!(package_descriptor("testpkg"), "testpkg");
        assert_eq!(type_descriptor("testpkg", "S"), "testpkg.S");
    }
}
