//! WMS 1.1.1
//!
//! Same structure as 1.3.0 without a default namespace. Bounding boxes come
//! from `LatLonBoundingBox`, reference systems from `SRS` and scale ranges
//! from `ScaleHint`.

use crate::mapping::{
    boolean, computed, float, integer, many, one, text, FieldMapping, NestedMapping,
    SchemaMapping, ServiceType, XLINK_NAMESPACE,
};
use crate::parsers::{ParserKind, ReverseParserKind};

const NAMESPACES: &[(&str, &str)] = &[("xlink", XLINK_NAMESPACE)];

fn keywords(base_xpath: &'static str) -> FieldMapping {
    many(
        "keywords",
        "Keyword",
        base_xpath,
        &["keyword"],
        vec![text("keyword", "text()")],
    )
}

fn contact() -> FieldMapping {
    one(
        "service_contact",
        "ServiceContact",
        "Service/ContactInformation",
        vec![
            text("person_name", "ContactPersonPrimary/ContactPerson/text()"),
            text("organization", "ContactPersonPrimary/ContactOrganization/text()"),
            text("position", "ContactPosition/text()"),
            text("address_type", "ContactAddress/AddressType/text()"),
            text("address", "ContactAddress/Address/text()"),
            text("city", "ContactAddress/City/text()"),
            text("state_or_province", "ContactAddress/StateOrProvince/text()"),
            text("postal_code", "ContactAddress/PostCode/text()"),
            text("country", "ContactAddress/Country/text()"),
            text("phone", "ContactVoiceTelephone/text()"),
            text("facsimile", "ContactFacsimileTelephone/text()"),
            text("email", "ContactElectronicMailAddress/text()"),
        ],
    )
}

fn layers() -> FieldMapping {
    many(
        "layers",
        "Layer",
        "Capability//Layer",
        &["identifier"],
        vec![
            text("identifier", "Name/text()"),
            text("parent_identifier", "../Name/text()"),
            text("title", "Title/text()"),
            text("abstract", "Abstract/text()"),
            boolean("is_queryable", "@queryable"),
            boolean("is_opaque", "@opaque"),
            integer("cascaded", "@cascaded"),
            float("scale_min", "ScaleHint/@min"),
            float("scale_max", "ScaleHint/@max"),
            computed(
                "bbox_lat_lon",
                &[
                    "LatLonBoundingBox/@minx",
                    "LatLonBoundingBox/@miny",
                    "LatLonBoundingBox/@maxx",
                    "LatLonBoundingBox/@maxy",
                ],
                ParserKind::BoundingBoxFromCorners,
                Some(ReverseParserKind::BoundingBoxToCorners),
            ),
            many(
                "reference_systems",
                "ReferenceSystem",
                "SRS",
                &[],
                vec![
                    computed("code", &["text()"], ParserKind::SridFromSrsName, None),
                    computed("prefix", &["text()"], ParserKind::AuthorityFromSrsName, None),
                ],
            ),
            many(
                "styles",
                "Style",
                "Style",
                &["name"],
                vec![
                    text("name", "Name/text()"),
                    text("title", "Title/text()"),
                    text("legend_url", "LegendURL/OnlineResource/@xlink:href"),
                    integer("legend_width", "LegendURL/@width"),
                    integer("legend_height", "LegendURL/@height"),
                    text("legend_format", "LegendURL/Format/text()"),
                ],
            ),
            many(
                "dimensions",
                "Dimension",
                "Dimension",
                &["name"],
                vec![text("name", "@name"), text("units", "@units")],
            ),
            keywords("KeywordList/Keyword"),
        ],
    )
}

pub(crate) fn mapping() -> SchemaMapping {
    SchemaMapping {
        service_type: ServiceType::Wms,
        versions: &["1.1.1"],
        namespaces: NAMESPACES,
        root: NestedMapping {
            model: "Service",
            base_xpath: "/WMT_MS_Capabilities",
            many: false,
            key_fields: &[],
            fields: vec![
                text("version", "@version"),
                text("name", "Service/Name/text()"),
                computed(
                    "service_type",
                    &["Service/Name/text()"],
                    ParserKind::ServiceTypeFromName,
                    None,
                ),
                text("title", "Service/Title/text()"),
                text("abstract", "Service/Abstract/text()"),
                text("fees", "Service/Fees/text()"),
                text("access_constraints", "Service/AccessConstraints/text()"),
                text("online_resource", "Service/OnlineResource/@xlink:href"),
                keywords("Service/KeywordList/Keyword"),
                contact(),
                many(
                    "operation_urls",
                    "OperationUrl",
                    "Capability/Request/*/DCPType/HTTP/*",
                    &["operation", "method"],
                    vec![
                        text("operation", "local-name(../../..)"),
                        text("method", "local-name()"),
                        text("url", "OnlineResource/@xlink:href"),
                        many(
                            "mime_types",
                            "MimeType",
                            "../../../Format",
                            &["mime_type"],
                            vec![text("mime_type", "text()")],
                        ),
                    ],
                ),
                layers(),
            ],
        },
    }
}
