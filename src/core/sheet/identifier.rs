// Pulls the spreadsheet id out of whatever the user pasted.
//
// Users paste full share links ("https://docs.google.com/spreadsheets/d/<id>/edit#gid=0")
// as often as bare ids, so both are accepted.

const ID_MARKER: &str = "/d/";

fn is_id_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-'
}

/// Extracts the resource id from a share link, or returns the trimmed input.
///
/// The first `/d/<token>` segment wins, where the token is made of ASCII
/// letters, digits and hyphens. Never fails: an empty reference yields an
/// empty id and the storage call downstream reports the problem.
pub fn extract_identifier(reference: &str) -> String {
    for (start, _) in reference.match_indices(ID_MARKER) {
        let after = &reference[start + ID_MARKER.len()..];
        let end = after.find(|c: char| !is_id_char(c)).unwrap_or(after.len());
        if end > 0 {
            return after[..end].to_string();
        }
    }

    reference.trim().to_string()
}
