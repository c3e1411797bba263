/// Returns true when `needle` appears anywhere in the row, ignoring case.
///
/// Cells are joined with a single space before matching, so a needle may
/// span two adjacent cells. An empty needle never excludes anything.
pub fn should_exclude(row: &[String], needle: &str) -> bool {
    if needle.is_empty() {
        return false;
    }

    row.join(" ").to_lowercase().contains(&needle.to_lowercase())
}
