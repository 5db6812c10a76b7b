//! Builtin function vocabularies, keyed by dialect.

/// Functions built into SQLite, including aggregates, scalar functions,
/// date/time functions, math functions, window functions, and the JSON1
/// extension. Matched case-insensitively.
pub(super) static SQLITE_FUNCTIONS: &[&str] = &[
    // Aggregates
    "AVG",
    "COUNT",
    "GROUP_CONCAT",
    "MAX",
    "MIN",
    "SUM",
    "TOTAL",
    // Scalar
    "ABS",
    "CHANGES",
    "CHAR",
    "COALESCE",
    "GLOB",
    "HEX",
    "IFNULL",
    "IIF",
    "INSTR",
    "LAST_INSERT_ROWID",
    "LENGTH",
    "LIKE",
    "LIKELIHOOD",
    "LIKELY",
    "LOAD_EXTENSION",
    "LOWER",
    "LTRIM",
    "NULLIF",
    "PRINTF",
    "QUOTE",
    "RANDOM",
    "RANDOMBLOB",
    "REPLACE",
    "ROUND",
    "RTRIM",
    "SIGN",
    "SOUNDEX",
    "SUBSTR",
    "SUBSTRING",
    "TOTAL_CHANGES",
    "TRIM",
    "TYPEOF",
    "UNICODE",
    "UNLIKELY",
    "UPPER",
    "ZEROBLOB",
    // Date and time
    "DATE",
    "TIME",
    "DATETIME",
    "JULIANDAY",
    "UNIXEPOCH",
    "STRFTIME",
    "TIMEDIFF",
    "CURRENT_DATE",
    "CURRENT_TIME",
    "CURRENT_TIMESTAMP",
    // Math
    "ACOS",
    "ACOSH",
    "ASIN",
    "ASINH",
    "ATAN",
    "ATAN2",
    "ATANH",
    "CEIL",
    "CEILING",
    "COS",
    "COSH",
    "DEGREES",
    "EXP",
    "FLOOR",
    "LN",
    "LOG",
    "LOG10",
    "LOG2",
    "MOD",
    "PI",
    "POW",
    "POWER",
    "RADIANS",
    "SIN",
    "SINH",
    "SQRT",
    "TAN",
    "TANH",
    "TRUNC",
    // Window
    "ROW_NUMBER",
    "RANK",
    "DENSE_RANK",
    "NTILE",
    "LAG",
    "LEAD",
    "FIRST_VALUE",
    "LAST_VALUE",
    "NTH_VALUE",
    "CUME_DIST",
    "PERCENT_RANK",
    // JSON1 extension
    "JSON",
    "JSON_ARRAY",
    "JSON_ARRAY_LENGTH",
    "JSON_EXTRACT",
    "JSON_INSERT",
    "JSON_OBJECT",
    "JSON_PATCH",
    "JSON_REMOVE",
    "JSON_REPLACE",
    "JSON_SET",
    "JSON_TYPE",
    "JSON_VALID",
    "JSON_QUOTE",
    "JSON_GROUP_ARRAY",
    "JSON_GROUP_OBJECT",
    // Misc
    "CAST",
];
