//! Import round-trip check.

use sitecheck_types::{AttributeStore, ResourceAddress};
use std::collections::BTreeSet;
use tracing::debug;

use crate::error::{Verdict, VerifyError};

/// Compare state read back by importing a resource against the state the
/// apply recorded for it.
///
/// Keys listed in `ignore` are skipped; these are configuration-only
/// attributes the remote API never returns. The first differing key in
/// lexical order is reported.
pub fn verify_import(
    address: &ResourceAddress,
    applied: &AttributeStore,
    imported: &AttributeStore,
    ignore: &[String],
) -> Verdict {
    let keys: BTreeSet<&str> = applied
        .iter()
        .chain(imported.iter())
        .map(|(key, _)| key)
        .filter(|key| !ignore.iter().any(|ignored| ignored.as_str() == *key))
        .collect();

    for key in keys {
        let (left, right) = (applied.get(key), imported.get(key));
        if left != right {
            return Err(VerifyError::ImportMismatch {
                address: address.clone(),
                key: key.to_string(),
                applied: left.map(str::to_string),
                imported: right.map(str::to_string),
            });
        }
    }

    debug!(%address, attributes = applied.len(), "Import state matches");
    Ok(())
}
