//! CSW 2.0.2
//!
//! CSW uses OWS 1.0; with `ows` bound to the 1.0 namespace the OWS blocks of
//! the WFS table apply unchanged.

use crate::mapping::{
    computed, many, text, NestedMapping, SchemaMapping, ServiceType, CSW_NAMESPACE,
    OWS_10_NAMESPACE, XLINK_NAMESPACE,
};
use crate::parsers::ParserKind;
use crate::tables::wfs200::{ows_contact, ows_operation_urls};

const NAMESPACES: &[(&str, &str)] = &[
    ("csw", CSW_NAMESPACE),
    ("ows", OWS_10_NAMESPACE),
    ("xlink", XLINK_NAMESPACE),
];

pub(crate) fn mapping() -> SchemaMapping {
    SchemaMapping {
        service_type: ServiceType::Csw,
        versions: &["2.0.2"],
        namespaces: NAMESPACES,
        root: NestedMapping {
            model: "Service",
            base_xpath: "/csw:Capabilities",
            many: false,
            key_fields: &[],
            fields: vec![
                text("version", "@version"),
                computed(
                    "service_type",
                    &["ows:ServiceIdentification/ows:ServiceType/text()"],
                    ParserKind::ServiceTypeFromName,
                    None,
                ),
                text("title", "ows:ServiceIdentification/ows:Title/text()"),
                text("abstract", "ows:ServiceIdentification/ows:Abstract/text()"),
                text("fees", "ows:ServiceIdentification/ows:Fees/text()"),
                text(
                    "access_constraints",
                    "ows:ServiceIdentification/ows:AccessConstraints/text()",
                ),
                text("online_resource", "ows:ServiceProvider/ows:ProviderSite/@xlink:href"),
                many(
                    "keywords",
                    "Keyword",
                    "ows:ServiceIdentification/ows:Keywords/ows:Keyword",
                    &["keyword"],
                    vec![text("keyword", "text()")],
                ),
                ows_contact(),
                ows_operation_urls("../../../ows:Parameter[@name='outputFormat']/ows:Value"),
            ],
        },
    }
}
