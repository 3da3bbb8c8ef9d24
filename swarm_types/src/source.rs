/// Record-decoding strategy for an object. `Json` is the only implemented variant; others are
/// reserved so a future parser can be added without breaking the wire shape of policy output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Parser {
    Json,
}

/// Wire compression applied to an object's bytes before parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    None,
    Gzip,
}

/// Policy-classified decoding recipe for an Object. One Object may map to zero or more Sources;
/// zero is a configuration failure (`PolicyMissing`).
#[derive(Debug, Clone, PartialEq)]
pub struct Source {
    pub parser: Parser,
    pub schema_tag: String,
    pub compression: Compression,
}

impl Source {
    pub fn new(parser: Parser, schema_tag: impl Into<String>, compression: Compression) -> Self {
        Self {
            parser,
            schema_tag: schema_tag.into(),
            compression,
        }
    }
}
