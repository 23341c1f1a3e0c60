//! WFS 2.0.0 and 2.0.2 (identical capabilities structure)

use crate::mapping::{
    computed, many, one, text, FieldMapping, NestedMapping, SchemaMapping, ServiceType,
    FES_20_NAMESPACE, OWS_11_NAMESPACE, WFS_20_NAMESPACE, XLINK_NAMESPACE,
};
use crate::parsers::{ParserKind, ReverseParserKind};

const NAMESPACES: &[(&str, &str)] = &[
    ("wfs", WFS_20_NAMESPACE),
    ("ows", OWS_11_NAMESPACE),
    ("fes", FES_20_NAMESPACE),
    ("xlink", XLINK_NAMESPACE),
];

fn keywords(base_xpath: &'static str) -> FieldMapping {
    many(
        "keywords",
        "Keyword",
        base_xpath,
        &["keyword"],
        vec![text("keyword", "text()")],
    )
}

/// OWS 1.1 `ServiceProvider` block, shared with other OWS-based dialects.
pub(crate) fn ows_contact() -> FieldMapping {
    one(
        "service_contact",
        "ServiceContact",
        "ows:ServiceProvider",
        vec![
            text("organization", "ows:ProviderName/text()"),
            text("person_name", "ows:ServiceContact/ows:IndividualName/text()"),
            text("position", "ows:ServiceContact/ows:PositionName/text()"),
            text("phone", "ows:ServiceContact/ows:ContactInfo/ows:Phone/ows:Voice/text()"),
            text(
                "facsimile",
                "ows:ServiceContact/ows:ContactInfo/ows:Phone/ows:Facsimile/text()",
            ),
            text(
                "address",
                "ows:ServiceContact/ows:ContactInfo/ows:Address/ows:DeliveryPoint/text()",
            ),
            text("city", "ows:ServiceContact/ows:ContactInfo/ows:Address/ows:City/text()"),
            text(
                "state_or_province",
                "ows:ServiceContact/ows:ContactInfo/ows:Address/ows:AdministrativeArea/text()",
            ),
            text(
                "postal_code",
                "ows:ServiceContact/ows:ContactInfo/ows:Address/ows:PostalCode/text()",
            ),
            text(
                "country",
                "ows:ServiceContact/ows:ContactInfo/ows:Address/ows:Country/text()",
            ),
            text(
                "email",
                "ows:ServiceContact/ows:ContactInfo/ows:Address/ows:ElectronicMailAddress/text()",
            ),
        ],
    )
}

/// OWS `OperationsMetadata` endpoints.
pub(crate) fn ows_operation_urls(output_formats: &'static str) -> FieldMapping {
    many(
        "operation_urls",
        "OperationUrl",
        "ows:OperationsMetadata/ows:Operation/ows:DCP/ows:HTTP/*",
        &["operation", "method"],
        vec![
            text("operation", "../../../@name"),
            text("method", "local-name()"),
            text("url", "@xlink:href"),
            many(
                "mime_types",
                "MimeType",
                output_formats,
                &["mime_type"],
                vec![text("mime_type", "text()")],
            ),
        ],
    )
}

fn feature_types() -> FieldMapping {
    many(
        "feature_types",
        "FeatureType",
        "wfs:FeatureTypeList/wfs:FeatureType",
        &["identifier"],
        vec![
            text("identifier", "wfs:Name/text()"),
            text("title", "wfs:Title/text()"),
            text("abstract", "wfs:Abstract/text()"),
            computed(
                "default_srs_code",
                &["wfs:DefaultCRS/text()"],
                ParserKind::SridFromSrsName,
                None,
            ),
            computed(
                "default_srs_prefix",
                &["wfs:DefaultCRS/text()"],
                ParserKind::AuthorityFromSrsName,
                None,
            ),
            computed(
                "bbox_lat_lon",
                &[
                    "ows:WGS84BoundingBox/ows:LowerCorner/text()",
                    "ows:WGS84BoundingBox/ows:UpperCorner/text()",
                ],
                ParserKind::BoundingBoxFromOwsCorners,
                Some(ReverseParserKind::BoundingBoxToOwsCorners),
            ),
            many(
                "reference_systems",
                "ReferenceSystem",
                "wfs:OtherCRS",
                &[],
                vec![
                    computed("code", &["text()"], ParserKind::SridFromSrsName, None),
                    computed("prefix", &["text()"], ParserKind::AuthorityFromSrsName, None),
                ],
            ),
            many(
                "output_formats",
                "MimeType",
                "wfs:OutputFormats/wfs:Format",
                &["mime_type"],
                vec![text("mime_type", "text()")],
            ),
            keywords("ows:Keywords/ows:Keyword"),
        ],
    )
}

pub(crate) fn mapping() -> SchemaMapping {
    SchemaMapping {
        service_type: ServiceType::Wfs,
        versions: &["2.0.0", "2.0.2"],
        namespaces: NAMESPACES,
        root: NestedMapping {
            model: "Service",
            base_xpath: "/wfs:WFS_Capabilities",
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
                keywords("ows:ServiceIdentification/ows:Keywords/ows:Keyword"),
                ows_contact(),
                ows_operation_urls(
                    "../../../ows:Parameter[@name='outputFormat']/ows:AllowedValues/ows:Value",
                ),
                feature_types(),
            ],
        },
    }
}
