use super::*;
use crate::config::DEFAULT_MAX_DEPTH;
use crate::types::{NodeKind, PathNode};
use yare::parameterized;

fn ids(path: &[PathNode]) -> Vec<&str> {
    path.iter().map(|node| node.id.as_str()).collect()
}

#[test]
fn test_root_path_is_single_element() {
    let directory = organization();
    let resolver = OrgResolver::new(&directory);
    let path = resolver.resolve_path(ROOT).unwrap();
    assert_eq!(path, vec![PathNode::root(ROOT)]);
    assert!(directory.calls().is_empty(), "root needs no directory calls");
}

#[test]
fn test_account_path_is_root_first() {
    let directory = organization();
    let resolver = OrgResolver::new(&directory);
    let path = resolver.resolve_path(PROD_APP).unwrap();
    insta::assert_json_snapshot!(path, @r#"
    [
      {
        "Id": "r-ab12",
        "Name": "Root",
        "Type": "ROOT"
      },
      {
        "Id": "ou-ab12-11111111",
        "Name": "Workloads",
        "Type": "ORGANIZATIONAL_UNIT"
      },
      {
        "Id": "ou-ab12-22222222",
        "Name": "Prod",
        "Type": "ORGANIZATIONAL_UNIT"
      },
      {
        "Id": "111111111111",
        "Name": "prod-app",
        "Type": "ACCOUNT"
      }
    ]
    "#);
}

#[parameterized(
    ou_under_root = { WORKLOADS, &[ROOT, WORKLOADS] },
    nested_ou = { PROD, &[ROOT, WORKLOADS, PROD] },
    account_in_ou = { STAGING, &[ROOT, WORKLOADS, STAGING] },
    account_under_root = { MANAGEMENT, &[ROOT, MANAGEMENT] },
    deep_account = { PROD_APP, &[ROOT, WORKLOADS, PROD, PROD_APP] },
)]
fn test_paths(id: &str, expected: &[&str]) {
    let directory = organization();
    let resolver = OrgResolver::new(&directory);
    let path = resolver.resolve_path(id).unwrap();
    assert_eq!(ids(&path), expected);
    assert_eq!(path.first().map(|n| n.kind), Some(NodeKind::Root));
    assert_eq!(path.last().map(|n| n.id.as_str()), Some(id));
}

#[parameterized(
    one = { 1 },
    two = { 2 },
    unbounded = { 1000 },
)]
fn test_path_independent_of_page_size(page_size: usize) {
    let directory = paged_organization(page_size);
    let resolver = OrgResolver::new(&directory);
    let path = resolver.resolve_path(PROD_APP).unwrap();
    assert_eq!(ids(&path), vec![ROOT, WORKLOADS, PROD, PROD_APP]);
}

#[test]
fn test_unknown_id_fails_without_calls() {
    let directory = organization();
    let resolver = OrgResolver::new(&directory);
    let err = resolver.resolve_path("prod-app").unwrap_err();
    assert_eq!(err, OrgError::UnknownIdentifierFormat("prod-app".into()));
    assert!(directory.calls().is_empty());
}

#[test]
fn test_describe_failure_aborts_walk() {
    let directory = organization_builder()
        .fail(
            DirectoryOperation::DescribeOrganizationalUnit,
            Some(WORKLOADS),
            denied("no describe"),
        )
        .build();
    let resolver = OrgResolver::new(&directory);
    let err = resolver.resolve_path(PROD_APP).unwrap_err();
    assert!(matches!(
        err,
        OrgError::DirectoryCallFailed {
            operation: DirectoryOperation::DescribeOrganizationalUnit,
            ref target,
            ..
        } if target == WORKLOADS
    ));
}

#[test]
fn test_list_parents_failure_aborts_walk() {
    let directory = organization_builder()
        .fail(DirectoryOperation::ListParents, Some(PROD), denied("no parents"))
        .build();
    let resolver = OrgResolver::new(&directory);
    let err = resolver.resolve_path(PROD_APP).unwrap_err();
    assert_eq!(
        err.directory_error().map(|e| e.code),
        Some(DirectoryErrorCode::AccessDenied)
    );
}

#[test]
fn test_missing_parent_is_invariant_violation() {
    let directory = organization_builder()
        .parents(STAGING, Vec::<String>::new())
        .build();
    let resolver = OrgResolver::new(&directory);
    assert!(matches!(
        resolver.resolve_path(STAGING),
        Err(OrgError::InvariantViolation(_))
    ));
}

#[test]
fn test_multiple_parents_is_invariant_violation() {
    let directory = organization_builder()
        .parents(STAGING, [WORKLOADS, SANDBOX])
        .build();
    let resolver = OrgResolver::new(&directory);
    let err = resolver.resolve_path(STAGING).unwrap_err();
    assert_eq!(
        err,
        OrgError::InvariantViolation(format!(
            "expected exactly one parent for {STAGING}, found 2"
        ))
    );
}

#[test]
fn test_parent_cycle_hits_depth_limit() {
    let directory = organization_builder()
        .parents(WORKLOADS, [PROD])
        .build();
    let resolver = OrgResolver::with_config(&directory, ResolverConfig::new().with_max_depth(8))
        .unwrap();
    assert!(matches!(
        resolver.resolve_path(PROD_APP),
        Err(OrgError::InvariantViolation(_))
    ));
    assert_eq!(
        directory.calls_for(DirectoryOperation::ListParents).len(),
        8
    );
}

#[test]
fn test_self_parent_fails_instead_of_looping() {
    let directory = organization_builder().parents(PROD, [PROD]).build();
    let resolver = OrgResolver::new(&directory);
    let err = resolver.resolve_path(PROD_APP).unwrap_err();
    assert_eq!(
        err,
        OrgError::InvariantViolation(format!(
            "ancestor walk from {PROD_APP} exceeded {DEFAULT_MAX_DEPTH} levels"
        ))
    );
}

#[parameterized(
    by_name = { "sandbox-1" },
    by_id = { SANDBOX_ONE },
)]
fn test_resolve_account_path(account: &str) {
    let directory = organization();
    let resolver = OrgResolver::new(&directory);
    let path = resolver.resolve_account_path(account).unwrap();
    assert_eq!(ids(&path), vec![ROOT, SANDBOX, SANDBOX_ONE]);
}

#[test]
fn test_resolve_account_path_by_name_containing_digits() {
    let directory = organization_builder()
        .account("444444444444", "build-202401011200", SANDBOX)
        .build();
    let resolver = OrgResolver::new(&directory);
    let path = resolver.resolve_account_path("build-202401011200").unwrap();
    assert_eq!(ids(&path), vec![ROOT, SANDBOX, "444444444444"]);
    assert_eq!(path[2].name, "build-202401011200");
}

#[test]
fn test_resolve_account_path_unknown_name() {
    let directory = organization();
    let resolver = OrgResolver::new(&directory);
    assert_eq!(
        resolver.resolve_account_path("nope").unwrap_err(),
        OrgError::AccountNotFound("nope".into())
    );
}
