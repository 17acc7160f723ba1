//! Toggle-membership-in-set, shared by medicine selection and the
//! category/brand filters.

/// Remove `candidate` if present, else append it. Selection order is
/// preserved for the remaining elements, and toggling twice restores the
/// original set.
pub fn toggle_membership<T: PartialEq>(selection: &mut Vec<T>, candidate: T) {
    if let Some(pos) = selection.iter().position(|existing| *existing == candidate) {
        selection.remove(pos);
    } else {
        selection.push(candidate);
    }
}
