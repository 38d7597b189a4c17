// Copyright (c) 2024 Jens Obermayer <jens@ds-intg.dev>
// SPDX-License-Identifier: MPL-2.0

use std::env;
use std::ffi::OsStr;

/// Retrieves a boolean value from the given environment variable.
///
/// The following string values are considered true: `true` or `1`.
///
/// Returns `false` if the variable is not defined or contains an invalid value.
pub fn bool_from_env<K: AsRef<OsStr>>(key: K) -> bool {
    env::var(key)
        .map(|v| v == "true" || v == "1")
        .unwrap_or_default()
}

/// Parse a message-tracing environment variable into `(incoming, outgoing)` flags.
///
/// Valid values: `all`, `in`, `out`.
pub fn msg_tracing_from_env<K: AsRef<OsStr>>(key: K) -> (bool, bool) {
    let value = env::var(key).unwrap_or_default();
    (
        value == "all" || value == "in",
        value == "all" || value == "out",
    )
}
