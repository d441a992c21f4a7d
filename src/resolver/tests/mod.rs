use super::*;
use crate::directory::DirectoryOperation;
use crate::error::{DirectoryError, DirectoryErrorCode};
use crate::memory::{InMemoryDirectory, InMemoryDirectoryBuilder};
use crate::types::{PolicySummary, PolicyType};

mod path;

pub(super) const ROOT: &str = "r-ab12";
pub(super) const WORKLOADS: &str = "ou-ab12-11111111";
pub(super) const PROD: &str = "ou-ab12-22222222";
pub(super) const SANDBOX: &str = "ou-ab12-33333333";
pub(super) const PROD_APP: &str = "111111111111";
pub(super) const STAGING: &str = "222222222222";
pub(super) const SANDBOX_ONE: &str = "333333333333";
pub(super) const MANAGEMENT: &str = "999999999999";

const ALLOW_ALL: &str =
    r#"{"Version":"2012-10-17","Statement":[{"Effect":"Allow","Action":"*","Resource":"*"}]}"#;
const DENY_LEAVE: &str = r#"{"Version":"2012-10-17","Statement":[{"Effect":"Deny","Action":"organizations:LeaveOrganization","Resource":"*"}]}"#;
const REGION_LOCK: &str = r#"{"Version":"2012-10-17","Statement":[{"Effect":"Deny","NotAction":"iam:*","Resource":"*","Condition":{"StringNotEquals":{"aws:RequestedRegion":["eu-west-1"]}}}]}"#;
const DENY_PUBLIC_S3: &str = r#"{"Version":"2012-10-17","Statement":[{"Effect":"Deny","Action":"s3:PutBucketPublicAccessBlock","Resource":"*"}]}"#;
const DENY_IAM_USERS: &str = r#"{"Version":"2012-10-17","Statement":[{"Effect":"Deny","Action":"iam:CreateUser","Resource":"*"}]}"#;
const SANDBOX_GUARDRAILS: &str = r#"{"Version":"2012-10-17","Statement":{"Effect":"Deny","Action":"ec2:RunInstances","Resource":"*"}}"#;

/// ```text
/// r-ab12 Root                    [FullAWSAccess]
/// |-- ou Workloads               [DenyLeaveOrg, RegionLock]
/// |   |-- ou Prod                [DenyPublicS3, RegionLock]
/// |   |   |-- 111111111111 prod-app  [DenyIamUsers, DenyPublicS3]
/// |   |-- 222222222222 staging
/// |-- ou Sandbox                 [SandboxGuardrails]
/// |   |-- 333333333333 sandbox-1
/// |-- 999999999999 management
/// ```
pub(super) fn organization_builder() -> InMemoryDirectoryBuilder {
    InMemoryDirectory::builder()
        .root(ROOT)
        .organizational_unit(WORKLOADS, "Workloads", ROOT)
        .organizational_unit(SANDBOX, "Sandbox", ROOT)
        .organizational_unit(PROD, "Prod", WORKLOADS)
        .account(MANAGEMENT, "management", ROOT)
        .account(PROD_APP, "prod-app", PROD)
        .account(STAGING, "staging", WORKLOADS)
        .account(SANDBOX_ONE, "sandbox-1", SANDBOX)
        .scp("p-full", "FullAWSAccess", ALLOW_ALL)
        .scp("p-denyleave", "DenyLeaveOrg", DENY_LEAVE)
        .scp("p-region", "RegionLock", REGION_LOCK)
        .scp("p-s3", "DenyPublicS3", DENY_PUBLIC_S3)
        .scp("p-iam", "DenyIamUsers", DENY_IAM_USERS)
        .scp("p-sandbox", "SandboxGuardrails", SANDBOX_GUARDRAILS)
        .policy(
            PolicySummary::new("p-tags", "CostCenterTags", PolicyType::TagPolicy),
            r#"{"tags":{"costcenter":{}}}"#,
        )
        .attach("p-full", ROOT)
        .attach("p-tags", ROOT)
        .attach("p-denyleave", WORKLOADS)
        .attach("p-region", WORKLOADS)
        .attach("p-s3", PROD)
        .attach("p-region", PROD)
        .attach("p-iam", PROD_APP)
        .attach("p-s3", PROD_APP)
        .attach("p-sandbox", SANDBOX)
}

pub(super) fn organization() -> InMemoryDirectory {
    organization_builder().build()
}

pub(super) fn paged_organization(page_size: usize) -> InMemoryDirectory {
    organization_builder().page_size(page_size).build()
}

pub(super) fn denied(message: &str) -> DirectoryError {
    DirectoryError::new(DirectoryErrorCode::AccessDenied, message)
}

#[test]
fn test_resolver_uses_default_config() {
    let directory = organization();
    let resolver = OrgResolver::new(&directory);
    assert_eq!(resolver.config(), &ResolverConfig::default());
}

#[test]
fn test_with_config_rejects_invalid_config() {
    let directory = organization();
    let err = OrgResolver::with_config(&directory, ResolverConfig::new().with_max_depth(0))
        .unwrap_err();
    assert!(matches!(err, OrgError::Config(_)));
}

#[test]
fn test_resolver_is_shareable_across_threads() {
    use std::sync::Arc;
    use std::thread;

    let resolver = Arc::new(OrgResolver::new(organization()));
    let handles: Vec<_> = [PROD_APP, STAGING, SANDBOX_ONE, MANAGEMENT]
        .into_iter()
        .map(|account| {
            let resolver = Arc::clone(&resolver);
            thread::spawn(move || resolver.resolve_path(account).unwrap().len())
        })
        .collect();
    let depths: Vec<usize> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert_eq!(depths, vec![4, 3, 3, 2]);
}

#[test]
fn test_calls_are_recorded_per_operation() {
    let directory = organization();
    let resolver = OrgResolver::new(&directory);
    resolver.resolve_path(PROD_APP).unwrap();
    assert_eq!(
        directory.calls_for(DirectoryOperation::ListParents).len(),
        3
    );
    directory.reset_calls();
    assert!(directory.calls().is_empty());
}
