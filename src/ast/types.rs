use std::fmt;

use super::NodeId;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DataLocation {
    Memory,
    Storage,
    Calldata,
}

impl DataLocation {
    pub fn from_keyword(word: &str) -> Option<Self> {
        match word {
            "memory" => Some(Self::Memory),
            "storage" => Some(Self::Storage),
            "calldata" => Some(Self::Calldata),
            _ => None,
        }
    }
}

impl fmt::Display for DataLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Memory => write!(f, "memory"),
            Self::Storage => write!(f, "storage"),
            Self::Calldata => write!(f, "calldata"),
        }
    }
}

/// Structural type of a declaration or expression.
///
/// Supplied by the type-query surface and never mutated by passes; passes only
/// branch on the variant.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TypeNode {
    Int { signed: bool, bits: u16 },
    FixedBytes(u8),
    Bool,
    Address { payable: bool },
    Bytes,
    String,
    Array { element: Box<TypeNode>, length: Option<u64> },
    Mapping { key: Box<TypeNode>, value: Box<TypeNode> },
    Struct { name: String, definition: Option<NodeId> },
    Enum { name: String, definition: Option<NodeId> },
    Contract { name: String, definition: Option<NodeId> },
    Function { parameters: Vec<TypeNode>, returns: Vec<TypeNode> },
    Pointer { to: Box<TypeNode>, location: DataLocation },
    /// User-defined value type aliasing an elementary type.
    Alias { name: String, underlying: Box<TypeNode> },
    /// Type of an integer literal before it is converted to a concrete width.
    IntLiteral(String),
    StringLiteral,
    Tuple(Vec<TypeNode>),
}

impl TypeNode {
    pub fn uint(bits: u16) -> Self {
        Self::Int { signed: false, bits }
    }

    pub fn int(bits: u16) -> Self {
        Self::Int { signed: true, bits }
    }

    pub fn uint8() -> Self {
        Self::uint(8)
    }

    pub fn uint256() -> Self {
        Self::uint(256)
    }

    pub fn is_uint256(&self) -> bool {
        matches!(self, Self::Int { signed: false, bits: 256 })
    }

    /// Strip data-location pointers, leaving the value type underneath.
    pub fn generalize(&self) -> &TypeNode {
        match self {
            Self::Pointer { to, .. } => to.generalize(),
            other => other,
        }
    }

    /// Parse an elementary type keyword such as `uint`, `int64`, `bytes4`.
    pub fn elementary(word: &str) -> Option<Self> {
        match word {
            "bool" => return Some(Self::Bool),
            "address" => return Some(Self::Address { payable: false }),
            "bytes" => return Some(Self::Bytes),
            "string" => return Some(Self::String),
            "uint" => return Some(Self::uint256()),
            "int" => return Some(Self::int(256)),
            _ => {}
        }
        if let Some(bits) = word.strip_prefix("uint") {
            let bits: u16 = bits.parse().ok()?;
            return valid_int_width(bits).then(|| Self::uint(bits));
        }
        if let Some(bits) = word.strip_prefix("int") {
            let bits: u16 = bits.parse().ok()?;
            return valid_int_width(bits).then(|| Self::int(bits));
        }
        if let Some(size) = word.strip_prefix("bytes") {
            let size: u8 = size.parse().ok()?;
            return (1..=32).contains(&size).then_some(Self::FixedBytes(size));
        }
        None
    }

    /// Parse a textual type annotation as written on expression nodes.
    pub fn from_type_string(text: &str) -> Option<Self> {
        let text = text.trim();
        if let Some(value) = text.strip_prefix("int_const ") {
            return Some(Self::IntLiteral(value.to_string()));
        }
        if text.starts_with("literal_string") {
            return Some(Self::StringLiteral);
        }
        if text == "address payable" {
            return Some(Self::Address { payable: true });
        }
        if let Some(inner) = text.strip_prefix("tuple(").and_then(|t| t.strip_suffix(')')) {
            if inner.is_empty() {
                return Some(Self::Tuple(Vec::new()));
            }
            let members = inner
                .split(',')
                .map(Self::from_type_string)
                .collect::<Option<Vec<_>>>()?;
            return Some(Self::Tuple(members));
        }
        for location in ["memory", "storage", "calldata"] {
            if let Some(rest) = text.strip_suffix(location) {
                let to = Self::from_type_string(rest)?;
                let location = DataLocation::from_keyword(location)?;
                return Some(Self::Pointer { to: Box::new(to), location });
            }
        }
        if let Some(rest) = text.strip_suffix(']') {
            let open = rest.rfind('[')?;
            let element = Self::from_type_string(&rest[..open])?;
            let length = match &rest[open + 1..] {
                "" => None,
                n => Some(n.parse().ok()?),
            };
            return Some(Self::Array { element: Box::new(element), length });
        }
        Self::elementary(text)
    }
}

fn valid_int_width(bits: u16) -> bool {
    bits >= 8 && bits <= 256 && bits % 8 == 0
}

fn write_list(f: &mut fmt::Formatter<'_>, items: &[TypeNode]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, ",")?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}

impl fmt::Display for TypeNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int { signed: true, bits } => write!(f, "int{}", bits),
            Self::Int { signed: false, bits } => write!(f, "uint{}", bits),
            Self::FixedBytes(size) => write!(f, "bytes{}", size),
            Self::Bool => write!(f, "bool"),
            Self::Address { payable: true } => write!(f, "address payable"),
            Self::Address { payable: false } => write!(f, "address"),
            Self::Bytes => write!(f, "bytes"),
            Self::String => write!(f, "string"),
            Self::Array { element, length: Some(n) } => write!(f, "{}[{}]", element, n),
            Self::Array { element, length: None } => write!(f, "{}[]", element),
            Self::Mapping { key, value } => write!(f, "mapping({} => {})", key, value),
            Self::Struct { name, .. } => write!(f, "struct {}", name),
            Self::Enum { name, .. } => write!(f, "enum {}", name),
            Self::Contract { name, .. } => write!(f, "contract {}", name),
            Self::Function { parameters, returns } => {
                write!(f, "function (")?;
                write_list(f, parameters)?;
                write!(f, ")")?;
                if !returns.is_empty() {
                    write!(f, " returns (")?;
                    write_list(f, returns)?;
                    write!(f, ")")?;
                }
                Ok(())
            }
            Self::Pointer { to, location } => write!(f, "{} {}", to, location),
            Self::Alias { name, .. } => write!(f, "{}", name),
            Self::IntLiteral(value) => write!(f, "int_const {}", value),
            Self::StringLiteral => write!(f, "literal_string"),
            Self::Tuple(members) => {
                write!(f, "tuple(")?;
                write_list(f, members)?;
                write!(f, ")")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn elementary_keywords() {
        assert_eq!(TypeNode::elementary("uint"), Some(TypeNode::uint256()));
        assert_eq!(TypeNode::elementary("int64"), Some(TypeNode::int(64)));
        assert_eq!(TypeNode::elementary("bytes4"), Some(TypeNode::FixedBytes(4)));
        assert_eq!(TypeNode::elementary("bytes33"), None);
        assert_eq!(TypeNode::elementary("uint7"), None);
    }

    #[test]
    fn type_strings_parse_back() {
        for text in ["uint8", "bytes32", "bytes memory", "uint256[]", "uint8[4]", "tuple()", "int_const 7"] {
            let ty = TypeNode::from_type_string(text).expect(text);
            assert_eq!(ty.to_string(), text);
        }
    }

    #[test]
    fn generalize_strips_pointers() {
        let ty = TypeNode::from_type_string("bytes memory").unwrap();
        assert_eq!(ty.generalize(), &TypeNode::Bytes);
        assert_eq!(TypeNode::FixedBytes(2).generalize(), &TypeNode::FixedBytes(2));
    }
}
