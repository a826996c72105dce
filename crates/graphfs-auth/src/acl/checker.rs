//! Operation-level access checks against the request context.

use tracing::warn;

use graphfs_core::{AppError, AppResult};
use graphfs_entity::{AccessLevel, Resource};
use graphfs_graph::RequestContext;

use super::resolver::PermissionResolver;

/// Gates operations on the caller's effective access.
///
/// Resources the caller cannot even list are reported as missing, so a
/// denial never reveals more than the caller's access level implies.
#[derive(Debug, Clone, Copy, Default)]
pub struct AccessChecker {
    resolver: PermissionResolver,
}

impl AccessChecker {
    pub fn new(resolver: PermissionResolver) -> Self {
        Self { resolver }
    }

    /// Effective access of the request's principal, honouring its view flags.
    pub fn level(&self, ctx: &RequestContext, resource: &Resource) -> AppResult<AccessLevel> {
        Ok(self.resolver.effective_access(
            ctx.graph()?,
            resource,
            ctx.principal(),
            ctx.show_deleted(),
        ))
    }

    /// Whether the resource is visible at all.
    pub fn can_list(&self, ctx: &RequestContext, resource: &Resource) -> AppResult<bool> {
        Ok(self.level(ctx, resource)?.can_list())
    }

    /// Fail unless the caller holds at least `required`.
    pub fn require(
        &self,
        ctx: &RequestContext,
        resource: &Resource,
        required: AccessLevel,
    ) -> AppResult<AccessLevel> {
        let level = self.level(ctx, resource)?;
        Self::check(ctx, resource, level, required)
    }

    /// Fail unless the caller may manage the resource's lifecycle.
    ///
    /// Uses [`PermissionResolver::management_access`], so it also addresses
    /// tombstoned resources directly, regardless of the view flags.
    pub fn require_management(
        &self,
        ctx: &RequestContext,
        resource: &Resource,
        required: AccessLevel,
    ) -> AppResult<AccessLevel> {
        let level = self
            .resolver
            .management_access(ctx.graph()?, resource, ctx.principal());
        Self::check(ctx, resource, level, required)
    }

    fn check(
        ctx: &RequestContext,
        resource: &Resource,
        level: AccessLevel,
        required: AccessLevel,
    ) -> AppResult<AccessLevel> {
        if level.has_at_least(required) {
            return Ok(level);
        }
        warn!(
            principal = %ctx.principal(),
            path = %resource.path,
            %level,
            %required,
            "Access denied"
        );
        if !level.can_list() {
            return Err(AppError::not_found(format!(
                "No such resource: {}",
                resource.path
            )));
        }
        Err(AppError::authorization(format!(
            "{required} access is required on '{}'",
            resource.path
        )))
    }
}
