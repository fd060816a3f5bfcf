//! PostgreSQL type classification
//!
//! Maps catalog `data_type` names and driver-reported type names
//! to the value families the decoder knows how to read, and decides
//! which text parameters need a cast to reach their column type.

/// `information_schema.columns.data_type` reported for array columns
pub const ARRAY_DATA_TYPE: &str = "ARRAY";

pub fn is_array_data_type(data_type: &str) -> bool {
    data_type.eq_ignore_ascii_case(ARRAY_DATA_TYPE)
}

/// How a result column is read back into JSON
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueFamily {
    Boolean,
    SmallInt,
    Integer,
    BigInt,
    Real,
    Double,
    Numeric,
    Oid,
    Text,
    Json,
    Uuid,
    Timestamp,
    TimestampTz,
    Date,
    Time,
    TextArray,
    SmallIntArray,
    IntegerArray,
    BigIntArray,
    BooleanArray,
    DoubleArray,
    UuidArray,
    RealArray,
    NumericArray,
    JsonArray,
    DateArray,
    TimeArray,
    TimestampArray,
    TimestampTzArray,
    Interval,
    Bytea,
    Inet,
    MacAddr,
    /// Arrays of enums and other types read element by element as text
    OtherArray,
    /// Read through the text representation
    Other,
}

impl ValueFamily {
    pub fn is_array(self) -> bool {
        matches!(
            self,
            ValueFamily::TextArray
                | ValueFamily::SmallIntArray
                | ValueFamily::IntegerArray
                | ValueFamily::BigIntArray
                | ValueFamily::BooleanArray
                | ValueFamily::DoubleArray
                | ValueFamily::UuidArray
                | ValueFamily::RealArray
                | ValueFamily::NumericArray
                | ValueFamily::JsonArray
                | ValueFamily::DateArray
                | ValueFamily::TimeArray
                | ValueFamily::TimestampArray
                | ValueFamily::TimestampTzArray
                | ValueFamily::OtherArray
        )
    }
}

/// Classify a type name as reported by `sqlx::TypeInfo::name`
pub fn value_family(type_name: &str) -> ValueFamily {
    match type_name.to_ascii_uppercase().as_str() {
        "BOOL" => ValueFamily::Boolean,
        "INT2" => ValueFamily::SmallInt,
        "INT4" => ValueFamily::Integer,
        "INT8" => ValueFamily::BigInt,
        "FLOAT4" => ValueFamily::Real,
        "FLOAT8" => ValueFamily::Double,
        "NUMERIC" => ValueFamily::Numeric,
        "OID" => ValueFamily::Oid,
        "TEXT" | "VARCHAR" | "BPCHAR" | "CHAR" | "NAME" | "CITEXT" | "UNKNOWN" => ValueFamily::Text,
        "JSON" | "JSONB" => ValueFamily::Json,
        "UUID" => ValueFamily::Uuid,
        "TIMESTAMP" => ValueFamily::Timestamp,
        "TIMESTAMPTZ" => ValueFamily::TimestampTz,
        "DATE" => ValueFamily::Date,
        "TIME" => ValueFamily::Time,
        "INTERVAL" => ValueFamily::Interval,
        "BYTEA" => ValueFamily::Bytea,
        "INET" | "CIDR" => ValueFamily::Inet,
        "MACADDR" => ValueFamily::MacAddr,
        "TEXT[]" | "VARCHAR[]" | "BPCHAR[]" | "CHAR[]" | "NAME[]" | "CITEXT[]" => {
            ValueFamily::TextArray
        }
        "INT2[]" => ValueFamily::SmallIntArray,
        "INT4[]" => ValueFamily::IntegerArray,
        "INT8[]" => ValueFamily::BigIntArray,
        "BOOL[]" => ValueFamily::BooleanArray,
        "FLOAT8[]" => ValueFamily::DoubleArray,
        "UUID[]" => ValueFamily::UuidArray,
        "FLOAT4[]" => ValueFamily::RealArray,
        "NUMERIC[]" => ValueFamily::NumericArray,
        "JSON[]" | "JSONB[]" => ValueFamily::JsonArray,
        "DATE[]" => ValueFamily::DateArray,
        "TIME[]" => ValueFamily::TimeArray,
        "TIMESTAMP[]" => ValueFamily::TimestampArray,
        "TIMESTAMPTZ[]" => ValueFamily::TimestampTzArray,
        // `pg_type.typname` of user-defined arrays starts with an underscore
        name if name.ends_with("[]") || name.starts_with('_') => ValueFamily::OtherArray,
        _ => ValueFamily::Other,
    }
}

/// Types a text parameter reaches without a cast: the string types, plus
/// types whose text comparison the server resolves on its own.
const UNCAST_SCALARS: &[&str] = &[
    "text", "varchar", "bpchar", "char", "name", "citext", "unknown", "int2", "int4", "int8",
    "smallint", "integer", "bigint", "float4", "float8", "real", "bool", "boolean", "json",
    "jsonb", "oid",
];

const UNCAST_ELEMENTS: &[&str] = &["text", "varchar", "bpchar", "char", "name", "citext"];

/// Cast for a parameter bound as text (or `text[]`) against a column whose
/// `pg_type.typname` is `type_alias`.
///
/// Strings always bind as text, and PostgreSQL only converts text to
/// `uuid`, `timestamptz`, `date`, enums and the like through an explicit
/// cast. Returns the type name to append as `$n::name`, or `None` when the
/// column takes text as is or the alias is not a plain lower-case name.
///
/// ```
/// use type_mapping::text_parameter_cast;
///
/// assert_eq!(text_parameter_cast("uuid"), Some("uuid"));
/// assert_eq!(text_parameter_cast("_date"), Some("_date"));
/// assert_eq!(text_parameter_cast("int4"), None);
/// assert_eq!(text_parameter_cast("_text"), None);
/// ```
pub fn text_parameter_cast(type_alias: &str) -> Option<&str> {
    let plain = type_alias
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_lowercase() || c == '_')
        && type_alias
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');
    if !plain {
        return None;
    }

    let uncast = match type_alias.strip_prefix('_') {
        Some(element) => UNCAST_ELEMENTS.contains(&element),
        None => UNCAST_SCALARS.contains(&type_alias),
    };
    if uncast { None } else { Some(type_alias) }
}
