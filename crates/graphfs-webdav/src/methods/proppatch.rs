//! PROPPATCH method implementation (RFC 4918 Section 9.2).
//!
//! Writable properties live in the GraphFS namespace:
//!
//! - `g:comment` (set or remove)
//! - `g:status` and `g:accessMode` on collections (set)
//! - `g:access principal="…"` on collections (set a level, remove to revoke)
//! - `g:dateDeleted` (remove restores a deleted resource)
//!
//! The update is atomic: if any property is rejected nothing is applied.

use bytes::Bytes;
use http::{Request, Response, StatusCode};
use hyper::body::Body;
use quick_xml::escape::escape;
use quick_xml::events::{BytesStart, Event};
use quick_xml::name::{Namespace, ResolveResult};
use quick_xml::reader::NsReader;
use tracing;

use graphfs_core::{AppError, AppResult};
use graphfs_entity::AccessLevel;
use graphfs_graph::{RequestContext, TransactionMode};
use graphfs_vfs::PropertyUpdate;

use crate::body::{self, DavBody};
use crate::handler::DavHandler;
use crate::properties::{DAV_NS, GRAPHFS_NS, build_propstat_xml};

/// Handle a PROPPATCH request
pub async fn handle_proppatch<B>(
    handler: &DavHandler,
    ctx: &mut RequestContext,
    path: &str,
    req: Request<B>,
) -> AppResult<Response<DavBody>>
where
    B: Body<Data = Bytes> + Send + 'static,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let xml = handler.read_xml_body(req.into_body()).await?;
    let ops = parse_property_update(&xml)?;
    if ops.is_empty() {
        return Err(AppError::validation("PROPPATCH names no properties"));
    }
    let PropPatch {
        update,
        grants,
        restore,
        accepted,
        rejected,
    } = PropPatch::from_ops(ops)?;

    if !rejected.is_empty() {
        tracing::debug!(
            "PROPPATCH: user={}, path='{}', rejected={:?}",
            ctx.principal(),
            path,
            rejected
        );
        let props: Vec<(String, &str)> = rejected
            .into_iter()
            .map(|element| (element, "403 Forbidden"))
            .chain(
                accepted
                    .into_iter()
                    .map(|element| (element, "424 Failed Dependency")),
            )
            .collect();
        let href = handler.paths().href(path, false);
        return body::xml(StatusCode::MULTI_STATUS, build_propstat_xml(&href, &props));
    }

    let info = handler
        .in_transaction(ctx, TransactionMode::Write, |vfs, ctx| {
            if restore {
                vfs.undelete(ctx, path)?;
            }
            let info = vfs.set_properties(ctx, path, update)?;
            for (principal, level) in grants {
                vfs.set_access(ctx, path, principal, level)?;
            }
            Ok(info)
        })
        .await?;

    tracing::debug!(
        "PROPPATCH: user={}, path='{}', applied={}",
        ctx.principal(),
        path,
        accepted.len()
    );

    let props: Vec<(String, &str)> = accepted
        .into_iter()
        .map(|element| (element, "200 OK"))
        .collect();
    let href = handler.paths().href(path, info.is_container());
    body::xml(StatusCode::MULTI_STATUS, build_propstat_xml(&href, &props))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Instruction {
    Set,
    Remove,
}

/// One property named inside `<D:set>` or `<D:remove>`.
#[derive(Debug, Clone, PartialEq, Eq)]
struct PropertyOp {
    namespace: Option<String>,
    name: String,
    principal: Option<String>,
    instruction: Instruction,
    value: String,
}

impl PropertyOp {
    fn start(ns: &ResolveResult<'_>, e: &BytesStart<'_>, instruction: Instruction) -> AppResult<Self> {
        let namespace = match ns {
            ResolveResult::Bound(Namespace(uri)) => Some(String::from_utf8_lossy(uri).into_owned()),
            _ => None,
        };
        let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();

        let mut principal = None;
        for attr in e.attributes() {
            let attr = attr.map_err(|err| xml_error(err.into()))?;
            if attr.key.local_name().as_ref() == b"principal" {
                let value = attr.unescape_value().map_err(xml_error)?;
                principal = Some(value.into_owned());
            }
        }

        Ok(Self {
            namespace,
            name,
            principal,
            instruction,
            value: String::new(),
        })
    }

    /// Empty element naming this property in a multistatus response.
    fn element(&self) -> String {
        match self.namespace.as_deref() {
            Some(GRAPHFS_NS) => match &self.principal {
                Some(principal) => {
                    format!("<g:{} principal=\"{}\"/>", self.name, escape(principal))
                }
                None => format!("<g:{}/>", self.name),
            },
            Some(DAV_NS) => format!("<D:{}/>", self.name),
            Some(ns) => format!("<x:{} xmlns:x=\"{}\"/>", self.name, escape(ns)),
            None => format!("<{}/>", self.name),
        }
    }
}

fn xml_error(e: quick_xml::Error) -> AppError {
    AppError::validation(format!("Malformed PROPPATCH body: {e}"))
}

fn is_dav(ns: &ResolveResult<'_>) -> bool {
    matches!(ns, ResolveResult::Bound(Namespace(uri)) if *uri == DAV_NS.as_bytes())
}

/// Parse a `<D:propertyupdate>` document into property operations in
/// document order.
fn parse_property_update(xml: &str) -> AppResult<Vec<PropertyOp>> {
    let mut reader = NsReader::from_str(xml);
    reader.trim_text(true);

    let mut instruction: Option<Instruction> = None;
    let mut in_prop = false;
    let mut current: Option<PropertyOp> = None;
    let mut nested = 0usize;
    let mut ops = Vec::new();

    loop {
        let (ns, event) = reader.read_resolved_event().map_err(xml_error)?;
        match event {
            Event::Start(e) => {
                if current.is_some() {
                    nested += 1;
                } else if let (true, Some(instruction)) = (in_prop, instruction) {
                    current = Some(PropertyOp::start(&ns, &e, instruction)?);
                } else if is_dav(&ns) {
                    match e.local_name().as_ref() {
                        b"set" => instruction = Some(Instruction::Set),
                        b"remove" => instruction = Some(Instruction::Remove),
                        b"prop" => in_prop = instruction.is_some(),
                        _ => {}
                    }
                }
            }
            Event::Empty(e) => {
                if current.is_none() {
                    if let (true, Some(instruction)) = (in_prop, instruction) {
                        ops.push(PropertyOp::start(&ns, &e, instruction)?);
                    }
                }
            }
            Event::Text(t) => {
                if let Some(op) = current.as_mut() {
                    op.value.push_str(&t.unescape().map_err(xml_error)?);
                }
            }
            Event::CData(c) => {
                if let Some(op) = current.as_mut() {
                    op.value.push_str(&String::from_utf8_lossy(&c));
                }
            }
            Event::End(e) => {
                if current.is_some() {
                    if nested > 0 {
                        nested -= 1;
                    } else if let Some(op) = current.take() {
                        ops.push(op);
                    }
                } else if is_dav(&ns) {
                    match e.local_name().as_ref() {
                        b"prop" => in_prop = false,
                        b"set" | b"remove" => instruction = None,
                        _ => {}
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(ops)
}

/// Property operations sorted into what the VFS can apply and what it
/// rejects.
#[derive(Debug, Default)]
struct PropPatch {
    update: PropertyUpdate,
    grants: Vec<(String, AccessLevel)>,
    restore: bool,
    accepted: Vec<String>,
    rejected: Vec<String>,
}

impl PropPatch {
    fn from_ops(ops: Vec<PropertyOp>) -> AppResult<Self> {
        let mut patch = Self::default();
        for op in ops {
            let element = op.element();
            let accepted = op.namespace.as_deref() == Some(GRAPHFS_NS) && patch.accept(&op)?;
            if accepted {
                patch.accepted.push(element);
            } else {
                patch.rejected.push(element);
            }
        }
        Ok(patch)
    }

    /// Record a GraphFS property. `false` when it is not writable this way.
    fn accept(&mut self, op: &PropertyOp) -> AppResult<bool> {
        match (op.name.as_str(), op.instruction) {
            ("comment", Instruction::Set) => self.update.comment = Some(op.value.clone()),
            ("comment", Instruction::Remove) => self.update.comment = Some(String::new()),
            ("status", Instruction::Set) => self.update.status = Some(op.value.parse()?),
            ("accessMode", Instruction::Set) => self.update.access_mode = Some(op.value.parse()?),
            ("access", instruction) => {
                let principal = op.principal.clone().ok_or_else(|| {
                    AppError::validation("g:access requires a principal attribute")
                })?;
                let level = match instruction {
                    Instruction::Set => op.value.parse()?,
                    Instruction::Remove => AccessLevel::None,
                };
                self.grants.push((principal, level));
            }
            ("dateDeleted", Instruction::Remove) => self.restore = true,
            _ => return Ok(false),
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use graphfs_entity::{LifecycleStatus, PublicationMode};

    const HEADER: &str =
        r#"<D:propertyupdate xmlns:D="DAV:" xmlns:g="http://graphfs.io/ontology#">"#;

    fn doc(inner: &str) -> String {
        format!("<?xml version=\"1.0\"?>{HEADER}{inner}</D:propertyupdate>")
    }

    #[test]
    fn test_parses_set_and_remove() {
        let ops = parse_property_update(&doc(
            "<D:set><D:prop><g:comment>Q3 &amp; Q4</g:comment>\
             <g:access principal=\"carol\">read</g:access></D:prop></D:set>\
             <D:remove><D:prop><g:dateDeleted/></D:prop></D:remove>",
        ))
        .unwrap();

        assert_eq!(ops.len(), 3);
        assert_eq!(ops[0].name, "comment");
        assert_eq!(ops[0].value, "Q3 & Q4");
        assert_eq!(ops[0].instruction, Instruction::Set);
        assert_eq!(ops[1].principal.as_deref(), Some("carol"));
        assert_eq!(ops[2].name, "dateDeleted");
        assert_eq!(ops[2].instruction, Instruction::Remove);
        assert_eq!(ops[2].namespace.as_deref(), Some(GRAPHFS_NS));
    }

    #[test]
    fn test_sorts_into_update() {
        let ops = parse_property_update(&doc(
            "<D:set><D:prop><g:status>Archived</g:status>\
             <g:accessMode>DataPublished</g:accessMode></D:prop></D:set>\
             <D:remove><D:prop><g:comment/><g:access principal=\"bob\"/></D:prop></D:remove>",
        ))
        .unwrap();
        let patch = PropPatch::from_ops(ops).unwrap();

        assert!(patch.rejected.is_empty());
        assert_eq!(patch.update.status, Some(LifecycleStatus::Archived));
        assert_eq!(patch.update.access_mode, Some(PublicationMode::DataPublished));
        assert_eq!(patch.update.comment.as_deref(), Some(""));
        assert_eq!(patch.grants, vec![("bob".to_string(), AccessLevel::None)]);
        assert!(!patch.restore);
    }

    #[test]
    fn test_rejects_foreign_and_read_only_properties() {
        let ops = parse_property_update(&doc(
            "<D:set><D:prop><D:displayname>x</D:displayname>\
             <z:color xmlns:z=\"urn:z\">red</z:color>\
             <g:dateDeleted>now</g:dateDeleted>\
             <g:comment>fine</g:comment></D:prop></D:set>",
        ))
        .unwrap();
        let patch = PropPatch::from_ops(ops).unwrap();

        assert_eq!(
            patch.rejected,
            vec![
                "<D:displayname/>".to_string(),
                "<x:color xmlns:x=\"urn:z\"/>".to_string(),
                "<g:dateDeleted/>".to_string(),
            ]
        );
        assert_eq!(patch.accepted, vec!["<g:comment/>".to_string()]);
    }

    #[test]
    fn test_invalid_values() {
        let ops = parse_property_update(&doc(
            "<D:set><D:prop><g:status>Frozen</g:status></D:prop></D:set>",
        ))
        .unwrap();
        assert!(PropPatch::from_ops(ops).is_err());

        let ops = parse_property_update(&doc(
            "<D:set><D:prop><g:access>read</g:access></D:prop></D:set>",
        ))
        .unwrap();
        assert!(PropPatch::from_ops(ops).is_err());
    }
}
