/// Postgres object identifier.
///
/// The oid type is implemented as an unsigned four-byte integer.
///
/// <https://www.postgresql.org/docs/current/datatype-oid.html>
pub type Oid = u32;

macro_rules! oid {
    ($( $(#[$doc:meta])* $name:ident = $oid:literal, $pg:literal; )*) => {
        /// Well known postgres type object identifiers.
        ///
        /// Values are fixed by the server catalog `pg_type`.
        pub mod oid {
            use super::Oid;
            $(
                $(#[$doc])*
                pub const $name: Oid = $oid;
            )*
        }

        /// Returns the postgres type name of a well known [`Oid`].
        pub fn type_name(oid: Oid) -> Option<&'static str> {
            match oid {
                $($oid => Some($pg),)*
                _ => None,
            }
        }
    };
}

oid! {
    /// Placeholder type, not sent to the server.
    ///
    /// A zero type in `Parse` leaves the parameter type to the server instead.
    UNSPECIFIED = 2, "unspecified";
    BIT = 1560, "bit";
    BIT_ARRAY = 1561, "_bit";
    BOOL = 16, "bool";
    BOOL_ARRAY = 1000, "_bool";
    BOX = 603, "box";
    BPCHAR = 1042, "bpchar";
    BPCHAR_ARRAY = 1014, "_bpchar";
    BYTEA = 17, "bytea";
    BYTEA_ARRAY = 1001, "_bytea";
    CHAR = 18, "char";
    CHAR_ARRAY = 1002, "_char";
    DATE = 1082, "date";
    DATE_ARRAY = 1182, "_date";
    FLOAT4 = 700, "float4";
    FLOAT4_ARRAY = 1021, "_float4";
    FLOAT8 = 701, "float8";
    FLOAT8_ARRAY = 1022, "_float8";
    INT2 = 21, "int2";
    INT2_ARRAY = 1005, "_int2";
    INT4 = 23, "int4";
    INT4_ARRAY = 1007, "_int4";
    INT8 = 20, "int8";
    INT8_ARRAY = 1016, "_int8";
    INTERVAL = 1186, "interval";
    INTERVAL_ARRAY = 1187, "_interval";
    JSON = 114, "json";
    JSON_ARRAY = 199, "_json";
    JSONB = 3802, "jsonb";
    JSONB_ARRAY = 3807, "_jsonb";
    MONEY = 790, "money";
    MONEY_ARRAY = 791, "_money";
    NAME = 19, "name";
    NAME_ARRAY = 1003, "_name";
    NUMERIC = 1700, "numeric";
    NUMERIC_ARRAY = 1231, "_numeric";
    OID = 26, "oid";
    OID_ARRAY = 1028, "_oid";
    POINT = 600, "point";
    POINT_ARRAY = 1017, "_point";
    REF_CURSOR = 1790, "refcursor";
    REF_CURSOR_ARRAY = 2201, "_refcursor";
    TEXT = 25, "text";
    TEXT_ARRAY = 1009, "_text";
    TIME = 1083, "time";
    TIME_ARRAY = 1183, "_time";
    TIMESTAMP = 1114, "timestamp";
    TIMESTAMP_ARRAY = 1115, "_timestamp";
    TIMESTAMPTZ = 1184, "timestamptz";
    TIMESTAMPTZ_ARRAY = 1185, "_timestamptz";
    TIMETZ = 1266, "timetz";
    TIMETZ_ARRAY = 1270, "_timetz";
    /// Type of string literals whose type is not yet resolved.
    UNKNOWN = 705, "unknown";
    UUID = 2950, "uuid";
    UUID_ARRAY = 2951, "_uuid";
    VARBIT = 1562, "varbit";
    VARBIT_ARRAY = 1563, "_varbit";
    VARCHAR = 1043, "varchar";
    VARCHAR_ARRAY = 1015, "_varchar";
    VOID = 2278, "void";
    XML = 142, "xml";
    XML_ARRAY = 143, "_xml";
}

/// Display an [`Oid`] with its type name when known.
pub(crate) struct OidFmt(pub Oid);

impl std::fmt::Display for OidFmt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match type_name(self.0) {
            Some(name) => write!(f, "{name} ({})", self.0),
            None => write!(f, "oid {}", self.0),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn well_known_oids() {
        assert_eq!(oid::BOOL, 16);
        assert_eq!(oid::INT8, 20);
        assert_eq!(oid::VARCHAR_ARRAY, 1015);
        assert_eq!(oid::UUID, 2950);
        assert_eq!(type_name(1184), Some("timestamptz"));
        assert_eq!(type_name(1000), Some("_bool"));
        assert_eq!(type_name(424242), None);
        assert_eq!(OidFmt(23).to_string(), "int4 (23)");
    }
}
