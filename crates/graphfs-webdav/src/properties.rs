//! WebDAV property rendering (RFC 4918).

use chrono::{DateTime, Utc};
use quick_xml::escape::escape;

use graphfs_vfs::{EntryKind, ResourceInfo};

/// DAV namespace
pub const DAV_NS: &str = "DAV:";

/// Namespace of GraphFS-specific properties.
pub const GRAPHFS_NS: &str = "http://graphfs.io/ontology#";

/// Content type reported for containers.
const CONTAINER_CONTENT_TYPE: &str = "httpd/unix-directory";

/// Depth header values. `infinity` is served as `1`: listings never recurse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Depth {
    /// Only the resource itself
    Zero,
    /// Resource and its immediate children
    One,
}

impl Depth {
    /// Parse from a header value string
    pub fn from_header(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some("0") => Self::Zero,
            _ => Self::One,
        }
    }
}

/// One `<D:response>` of a PROPFIND multistatus.
#[derive(Debug, Clone)]
pub struct DavEntry<'a> {
    pub href: String,
    pub info: &'a ResourceInfo,
}

/// Format a DateTime as HTTP date (RFC 7231)
pub fn format_http_date(dt: &DateTime<Utc>) -> String {
    dt.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

/// Content type of an entry, guessed from its name for files.
pub fn content_type(info: &ResourceInfo) -> String {
    if info.is_container() {
        return CONTAINER_CONTENT_TYPE.to_string();
    }
    mime_guess::from_path(&info.name)
        .first_or_octet_stream()
        .to_string()
}

fn type_name(kind: EntryKind) -> &'static str {
    match kind {
        EntryKind::Root => "Root",
        EntryKind::Collection => "Collection",
        EntryKind::Directory => "Directory",
        EntryKind::File => "File",
    }
}

fn multistatus_open() -> String {
    let mut xml = String::from("<?xml version=\"1.0\" encoding=\"utf-8\"?>\n");
    xml.push_str(&format!(
        "<D:multistatus xmlns:D=\"{DAV_NS}\" xmlns:g=\"{GRAPHFS_NS}\">\n"
    ));
    xml
}

fn push_prop(xml: &mut String, name: &str, value: &str) {
    xml.push_str(&format!("        <{name}>{}</{name}>\n", escape(value)));
}

/// Generate a PROPFIND multistatus document.
pub fn build_multistatus_xml(entries: &[DavEntry<'_>]) -> String {
    let mut xml = multistatus_open();

    for entry in entries {
        let info = entry.info;
        xml.push_str("  <D:response>\n");
        xml.push_str(&format!("    <D:href>{}</D:href>\n", escape(&entry.href)));
        xml.push_str("    <D:propstat>\n");
        xml.push_str("      <D:prop>\n");

        push_prop(&mut xml, "D:displayname", &info.name);
        if info.is_container() {
            xml.push_str("        <D:resourcetype><D:collection/></D:resourcetype>\n");
        } else {
            xml.push_str("        <D:resourcetype/>\n");
            push_prop(&mut xml, "D:getcontentlength", &info.size.to_string());
        }
        push_prop(&mut xml, "D:getcontenttype", &content_type(info));
        if let Some(modified) = &info.date_modified {
            push_prop(&mut xml, "D:getlastmodified", &format_http_date(modified));
        }
        if let Some(created) = &info.date_created {
            push_prop(&mut xml, "D:creationdate", &created.to_rfc3339());
        }
        if let Some(etag) = info.etag() {
            push_prop(&mut xml, "D:getetag", &etag);
        }

        push_prop(&mut xml, "g:iri", &info.iri);
        push_prop(&mut xml, "g:type", type_name(info.kind));
        push_prop(&mut xml, "g:access", info.access.as_str());
        if info.kind != EntryKind::Root {
            push_prop(&mut xml, "g:status", info.status.as_str());
            push_prop(&mut xml, "g:accessMode", info.access_mode.as_str());
        }
        if !info.comment.is_empty() {
            push_prop(&mut xml, "g:comment", &info.comment);
        }
        if let Some(by) = &info.created_by {
            push_prop(&mut xml, "g:createdBy", by.as_str());
        }
        if let Some(by) = &info.modified_by {
            push_prop(&mut xml, "g:modifiedBy", by.as_str());
        }
        if let Some(owner) = &info.owned_by {
            push_prop(&mut xml, "g:ownedBy", owner.as_str());
        }
        if let Some(deleted) = &info.date_deleted {
            push_prop(&mut xml, "g:dateDeleted", &deleted.to_rfc3339());
        }
        if let Some(by) = &info.deleted_by {
            push_prop(&mut xml, "g:deletedBy", by.as_str());
        }
        if let Some(blob) = &info.blob {
            push_prop(&mut xml, "g:checksum", &blob.checksum_sha256);
        }

        xml.push_str("      </D:prop>\n");
        xml.push_str("      <D:status>HTTP/1.1 200 OK</D:status>\n");
        xml.push_str("    </D:propstat>\n");
        xml.push_str("  </D:response>\n");
    }

    xml.push_str("</D:multistatus>\n");
    xml
}

/// Generate a PROPPATCH multistatus: one propstat per distinct status.
///
/// `props` pairs a rendered empty property element with its status line,
/// e.g. `("<g:comment/>", "200 OK")`.
pub fn build_propstat_xml(href: &str, props: &[(String, &str)]) -> String {
    let mut xml = multistatus_open();
    xml.push_str("  <D:response>\n");
    xml.push_str(&format!("    <D:href>{}</D:href>\n", escape(href)));

    let mut statuses: Vec<&str> = props.iter().map(|(_, status)| *status).collect();
    statuses.sort_unstable();
    statuses.dedup();
    for status in statuses {
        xml.push_str("    <D:propstat>\n      <D:prop>\n");
        for (element, _) in props.iter().filter(|(_, s)| *s == status) {
            xml.push_str(&format!("        {element}\n"));
        }
        xml.push_str("      </D:prop>\n");
        xml.push_str(&format!("      <D:status>HTTP/1.1 {status}</D:status>\n"));
        xml.push_str("    </D:propstat>\n");
    }

    xml.push_str("  </D:response>\n");
    xml.push_str("</D:multistatus>\n");
    xml
}

#[cfg(test)]
mod tests {
    use super::*;
    use graphfs_core::traits::BlobInfo;
    use graphfs_core::types::{BlobId, PrincipalId};
    use graphfs_entity::{AccessLevel, Resource};

    fn file_info() -> ResourceInfo {
        let alice = PrincipalId::new("alice");
        let coll = Resource::collection("a", &alice, Utc::now());
        let mut file = Resource::file(
            "a/notes & plans.txt",
            coll.id,
            BlobInfo {
                id: BlobId::new("ff"),
                size: 5,
                checksum_sha256: "abc".to_string(),
            },
            &alice,
            Utc::now(),
        );
        file.comment = "<draft>".to_string();
        ResourceInfo::from_resource(&file, Some(&coll), AccessLevel::Write, "http://x/iri/")
    }

    #[test]
    fn test_depth_header() {
        assert_eq!(Depth::from_header(Some("0")), Depth::Zero);
        assert_eq!(Depth::from_header(Some("1")), Depth::One);
        assert_eq!(Depth::from_header(Some("infinity")), Depth::One);
        assert_eq!(Depth::from_header(None), Depth::One);
    }

    #[test]
    fn test_multistatus_escapes_and_reports_access() {
        let info = file_info();
        let xml = build_multistatus_xml(&[DavEntry {
            href: "/dav/a/notes%20%26%20plans.txt".to_string(),
            info: &info,
        }]);
        assert!(xml.contains("<D:displayname>notes &amp; plans.txt</D:displayname>"));
        assert!(xml.contains("<D:getcontentlength>5</D:getcontentlength>"));
        assert!(xml.contains("<D:getcontenttype>text/plain</D:getcontenttype>"));
        assert!(xml.contains("<g:access>write</g:access>"));
        assert!(xml.contains("<g:comment>&lt;draft&gt;</g:comment>"));
        assert!(xml.contains("<D:resourcetype/>"));
    }

    #[test]
    fn test_root_is_a_collection() {
        let root = ResourceInfo::root("http://x/iri/");
        let xml = build_multistatus_xml(&[DavEntry {
            href: "/dav/".to_string(),
            info: &root,
        }]);
        assert!(xml.contains("<D:collection/>"));
        assert!(!xml.contains("g:status"));
    }

    #[test]
    fn test_propstat_groups_by_status() {
        let xml = build_propstat_xml(
            "/dav/a",
            &[
                ("<g:comment/>".to_string(), "424 Failed Dependency"),
                ("<x:color xmlns:x=\"urn:x\"/>".to_string(), "403 Forbidden"),
            ],
        );
        assert_eq!(xml.matches("<D:propstat>").count(), 2);
        assert!(xml.contains("HTTP/1.1 403 Forbidden"));
    }
}
