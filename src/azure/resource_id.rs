//! ARM resource id parsing
//!
//! Ids look like
//! `/subscriptions/{sub}/resourceGroups/{rg}/providers/{ns}/{type}/{name}/...`.
//! Splitting on `/` leaves an empty segment 0, so the resource group is
//! segment 4.

const RESOURCE_GROUP_SEGMENT: usize = 4;

/// Resource group named by a resource id, exactly as written in the id
pub fn resource_group_from_id(id: &str) -> Option<&str> {
    id.split('/')
        .nth(RESOURCE_GROUP_SEGMENT)
        .filter(|segment| !segment.is_empty())
}

/// Last path segment of a resource id (the resource's own name)
pub fn name_from_id(id: &str) -> Option<&str> {
    id.trim_end_matches('/')
        .rsplit('/')
        .next()
        .filter(|segment| !segment.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    const ID: &str = "/subscriptions/0000/resourceGroups/My-RG/providers/Microsoft.DocumentDB/databaseAccounts/acct/mongodbDatabases/db1/collections/c1";

    #[test]
    fn test_resource_group_is_fifth_segment() {
        assert_eq!(resource_group_from_id(ID), Some("My-RG"));
    }

    #[test]
    fn test_short_ids_have_no_resource_group() {
        assert_eq!(resource_group_from_id("/subscriptions/0000"), None);
        assert_eq!(resource_group_from_id(""), None);
        assert_eq!(resource_group_from_id("/subscriptions/0000/resourceGroups/"), None);
    }

    #[test]
    fn test_name_from_id() {
        assert_eq!(name_from_id(ID), Some("c1"));
        assert_eq!(name_from_id("/a/b/"), Some("b"));
        assert_eq!(name_from_id(""), None);
    }
}
