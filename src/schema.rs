//! IFC entity class table.
//!
//! Maps entity class labels (`IFCWALL`) to compact 16-bit type codes and
//! back. The table ships the classes the loader itself resolves plus the
//! common classes hosts query; further classes can be registered at
//! runtime before a model is opened. Code `0` is the sentinel for labels
//! not present in the table — such lines are indexed but cannot be
//! queried by type.

use rustc_hash::FxHashMap;

// Spatial structure
pub const IFCPROJECT: u16 = 1;
pub const IFCSITE: u16 = 2;
pub const IFCBUILDING: u16 = 3;
pub const IFCBUILDINGSTOREY: u16 = 4;
pub const IFCSPACE: u16 = 5;

// Structural elements
pub const IFCWALL: u16 = 10;
pub const IFCWALLSTANDARDCASE: u16 = 11;
pub const IFCSLAB: u16 = 12;
pub const IFCBEAM: u16 = 13;
pub const IFCCOLUMN: u16 = 14;
pub const IFCROOF: u16 = 15;
pub const IFCSTAIR: u16 = 16;
pub const IFCRAILING: u16 = 17;
pub const IFCCURTAINWALL: u16 = 18;
pub const IFCPLATE: u16 = 19;
pub const IFCMEMBER: u16 = 20;
pub const IFCFOOTING: u16 = 21;
pub const IFCCOVERING: u16 = 22;

// Openings
pub const IFCDOOR: u16 = 30;
pub const IFCWINDOW: u16 = 31;
pub const IFCOPENINGELEMENT: u16 = 32;

// Relationships
pub const IFCRELAGGREGATES: u16 = 40;
pub const IFCRELCONTAINEDINSPATIALSTRUCTURE: u16 = 41;
pub const IFCRELDEFINESBYPROPERTIES: u16 = 42;
pub const IFCRELASSOCIATESMATERIAL: u16 = 43;
pub const IFCRELVOIDSELEMENT: u16 = 44;
pub const IFCRELFILLSELEMENT: u16 = 45;
pub const IFCRELDEFINESBYTYPE: u16 = 46;

// Properties
pub const IFCPROPERTYSET: u16 = 50;
pub const IFCPROPERTYSINGLEVALUE: u16 = 51;
pub const IFCPROPERTYENUMERATEDVALUE: u16 = 52;
pub const IFCELEMENTQUANTITY: u16 = 53;
pub const IFCQUANTITYLENGTH: u16 = 54;
pub const IFCQUANTITYAREA: u16 = 55;
pub const IFCQUANTITYVOLUME: u16 = 56;

// Materials and styles
pub const IFCMATERIAL: u16 = 60;
pub const IFCMATERIALLAYER: u16 = 61;
pub const IFCMATERIALLAYERSET: u16 = 62;
pub const IFCMATERIALLAYERSETUSAGE: u16 = 63;
pub const IFCMATERIALDEFINITIONREPRESENTATION: u16 = 64;
pub const IFCSTYLEDITEM: u16 = 65;
pub const IFCSTYLEDREPRESENTATION: u16 = 66;
pub const IFCPRESENTATIONSTYLEASSIGNMENT: u16 = 67;
pub const IFCSURFACESTYLE: u16 = 68;

// Units and context
pub const IFCUNITASSIGNMENT: u16 = 70;
pub const IFCSIUNIT: u16 = 71;
pub const IFCCONVERSIONBASEDUNIT: u16 = 72;
pub const IFCMEASUREWITHUNIT: u16 = 73;
pub const IFCDIMENSIONALEXPONENTS: u16 = 74;
pub const IFCGEOMETRICREPRESENTATIONCONTEXT: u16 = 75;
pub const IFCGEOMETRICREPRESENTATIONSUBCONTEXT: u16 = 76;

// Geometry
pub const IFCSHAPEREPRESENTATION: u16 = 80;
pub const IFCPRODUCTDEFINITIONSHAPE: u16 = 81;
pub const IFCEXTRUDEDAREASOLID: u16 = 82;
pub const IFCAXIS2PLACEMENT2D: u16 = 83;
pub const IFCAXIS2PLACEMENT3D: u16 = 84;
pub const IFCLOCALPLACEMENT: u16 = 85;
pub const IFCCARTESIANPOINT: u16 = 86;
pub const IFCDIRECTION: u16 = 87;
pub const IFCPOLYLINE: u16 = 88;
pub const IFCRECTANGLEPROFILEDEF: u16 = 89;
pub const IFCCIRCLEPROFILEDEF: u16 = 90;
pub const IFCARBITRARYCLOSEDPROFILEDEF: u16 = 91;
pub const IFCCARTESIANPOINTLIST2D: u16 = 92;
pub const IFCCARTESIANPOINTLIST3D: u16 = 93;
pub const IFCTRIANGULATEDFACESET: u16 = 94;
pub const IFCPOLYGONALFACESET: u16 = 95;
pub const IFCMAPPEDITEM: u16 = 96;
pub const IFCBOOLEANCLIPPINGRESULT: u16 = 97;
pub const IFCFACETEDBREP: u16 = 98;

// Actors and ownership
pub const IFCOWNERHISTORY: u16 = 100;
pub const IFCPERSON: u16 = 101;
pub const IFCORGANIZATION: u16 = 102;
pub const IFCPERSONANDORGANIZATION: u16 = 103;
pub const IFCAPPLICATION: u16 = 104;

// Simple value wrappers (inline typed values in argument lists)
pub const IFCLABEL: u16 = 110;
pub const IFCTEXT: u16 = 111;
pub const IFCIDENTIFIER: u16 = 112;
pub const IFCREAL: u16 = 113;
pub const IFCINTEGER: u16 = 114;
pub const IFCBOOLEAN: u16 = 115;
pub const IFCLOGICAL: u16 = 116;
pub const IFCPARAMETERVALUE: u16 = 117;
pub const IFCPOSITIVELENGTHMEASURE: u16 = 118;
pub const IFCLENGTHMEASURE: u16 = 119;
pub const IFCPLANEANGLEMEASURE: u16 = 120;

const TABLE: &[(&str, u16)] = &[
    ("IFCPROJECT", IFCPROJECT),
    ("IFCSITE", IFCSITE),
    ("IFCBUILDING", IFCBUILDING),
    ("IFCBUILDINGSTOREY", IFCBUILDINGSTOREY),
    ("IFCSPACE", IFCSPACE),
    ("IFCWALL", IFCWALL),
    ("IFCWALLSTANDARDCASE", IFCWALLSTANDARDCASE),
    ("IFCSLAB", IFCSLAB),
    ("IFCBEAM", IFCBEAM),
    ("IFCCOLUMN", IFCCOLUMN),
    ("IFCROOF", IFCROOF),
    ("IFCSTAIR", IFCSTAIR),
    ("IFCRAILING", IFCRAILING),
    ("IFCCURTAINWALL", IFCCURTAINWALL),
    ("IFCPLATE", IFCPLATE),
    ("IFCMEMBER", IFCMEMBER),
    ("IFCFOOTING", IFCFOOTING),
    ("IFCCOVERING", IFCCOVERING),
    ("IFCDOOR", IFCDOOR),
    ("IFCWINDOW", IFCWINDOW),
    ("IFCOPENINGELEMENT", IFCOPENINGELEMENT),
    ("IFCRELAGGREGATES", IFCRELAGGREGATES),
    (
        "IFCRELCONTAINEDINSPATIALSTRUCTURE",
        IFCRELCONTAINEDINSPATIALSTRUCTURE,
    ),
    ("IFCRELDEFINESBYPROPERTIES", IFCRELDEFINESBYPROPERTIES),
    ("IFCRELASSOCIATESMATERIAL", IFCRELASSOCIATESMATERIAL),
    ("IFCRELVOIDSELEMENT", IFCRELVOIDSELEMENT),
    ("IFCRELFILLSELEMENT", IFCRELFILLSELEMENT),
    ("IFCRELDEFINESBYTYPE", IFCRELDEFINESBYTYPE),
    ("IFCPROPERTYSET", IFCPROPERTYSET),
    ("IFCPROPERTYSINGLEVALUE", IFCPROPERTYSINGLEVALUE),
    ("IFCPROPERTYENUMERATEDVALUE", IFCPROPERTYENUMERATEDVALUE),
    ("IFCELEMENTQUANTITY", IFCELEMENTQUANTITY),
    ("IFCQUANTITYLENGTH", IFCQUANTITYLENGTH),
    ("IFCQUANTITYAREA", IFCQUANTITYAREA),
    ("IFCQUANTITYVOLUME", IFCQUANTITYVOLUME),
    ("IFCMATERIAL", IFCMATERIAL),
    ("IFCMATERIALLAYER", IFCMATERIALLAYER),
    ("IFCMATERIALLAYERSET", IFCMATERIALLAYERSET),
    ("IFCMATERIALLAYERSETUSAGE", IFCMATERIALLAYERSETUSAGE),
    (
        "IFCMATERIALDEFINITIONREPRESENTATION",
        IFCMATERIALDEFINITIONREPRESENTATION,
    ),
    ("IFCSTYLEDITEM", IFCSTYLEDITEM),
    ("IFCSTYLEDREPRESENTATION", IFCSTYLEDREPRESENTATION),
    (
        "IFCPRESENTATIONSTYLEASSIGNMENT",
        IFCPRESENTATIONSTYLEASSIGNMENT,
    ),
    ("IFCSURFACESTYLE", IFCSURFACESTYLE),
    ("IFCUNITASSIGNMENT", IFCUNITASSIGNMENT),
    ("IFCSIUNIT", IFCSIUNIT),
    ("IFCCONVERSIONBASEDUNIT", IFCCONVERSIONBASEDUNIT),
    ("IFCMEASUREWITHUNIT", IFCMEASUREWITHUNIT),
    ("IFCDIMENSIONALEXPONENTS", IFCDIMENSIONALEXPONENTS),
    (
        "IFCGEOMETRICREPRESENTATIONCONTEXT",
        IFCGEOMETRICREPRESENTATIONCONTEXT,
    ),
    (
        "IFCGEOMETRICREPRESENTATIONSUBCONTEXT",
        IFCGEOMETRICREPRESENTATIONSUBCONTEXT,
    ),
    ("IFCSHAPEREPRESENTATION", IFCSHAPEREPRESENTATION),
    ("IFCPRODUCTDEFINITIONSHAPE", IFCPRODUCTDEFINITIONSHAPE),
    ("IFCEXTRUDEDAREASOLID", IFCEXTRUDEDAREASOLID),
    ("IFCAXIS2PLACEMENT2D", IFCAXIS2PLACEMENT2D),
    ("IFCAXIS2PLACEMENT3D", IFCAXIS2PLACEMENT3D),
    ("IFCLOCALPLACEMENT", IFCLOCALPLACEMENT),
    ("IFCCARTESIANPOINT", IFCCARTESIANPOINT),
    ("IFCDIRECTION", IFCDIRECTION),
    ("IFCPOLYLINE", IFCPOLYLINE),
    ("IFCRECTANGLEPROFILEDEF", IFCRECTANGLEPROFILEDEF),
    ("IFCCIRCLEPROFILEDEF", IFCCIRCLEPROFILEDEF),
    ("IFCARBITRARYCLOSEDPROFILEDEF", IFCARBITRARYCLOSEDPROFILEDEF),
    ("IFCCARTESIANPOINTLIST2D", IFCCARTESIANPOINTLIST2D),
    ("IFCCARTESIANPOINTLIST3D", IFCCARTESIANPOINTLIST3D),
    ("IFCTRIANGULATEDFACESET", IFCTRIANGULATEDFACESET),
    ("IFCPOLYGONALFACESET", IFCPOLYGONALFACESET),
    ("IFCMAPPEDITEM", IFCMAPPEDITEM),
    ("IFCBOOLEANCLIPPINGRESULT", IFCBOOLEANCLIPPINGRESULT),
    ("IFCFACETEDBREP", IFCFACETEDBREP),
    ("IFCOWNERHISTORY", IFCOWNERHISTORY),
    ("IFCPERSON", IFCPERSON),
    ("IFCORGANIZATION", IFCORGANIZATION),
    ("IFCPERSONANDORGANIZATION", IFCPERSONANDORGANIZATION),
    ("IFCAPPLICATION", IFCAPPLICATION),
    ("IFCLABEL", IFCLABEL),
    ("IFCTEXT", IFCTEXT),
    ("IFCIDENTIFIER", IFCIDENTIFIER),
    ("IFCREAL", IFCREAL),
    ("IFCINTEGER", IFCINTEGER),
    ("IFCBOOLEAN", IFCBOOLEAN),
    ("IFCLOGICAL", IFCLOGICAL),
    ("IFCPARAMETERVALUE", IFCPARAMETERVALUE),
    ("IFCPOSITIVELENGTHMEASURE", IFCPOSITIVELENGTHMEASURE),
    ("IFCLENGTHMEASURE", IFCLENGTHMEASURE),
    ("IFCPLANEANGLEMEASURE", IFCPLANEANGLEMEASURE),
];

/// Bidirectional label ↔ type-code table. Read-only once a model starts
/// loading; shared between models behind an `Arc`.
#[derive(Debug, Clone)]
pub struct IfcSchema {
    by_name: FxHashMap<String, u16>,
    by_code: FxHashMap<u16, String>,
}

impl IfcSchema {
    pub fn new() -> Self {
        let mut schema = IfcSchema {
            by_name: FxHashMap::default(),
            by_code: FxHashMap::default(),
        };
        for &(name, code) in TABLE {
            schema.register(name, code);
        }
        schema
    }

    /// Adds a label ↔ code pair, replacing any previous binding of either.
    pub fn register(&mut self, name: &str, code: u16) {
        self.by_name.insert(name.to_string(), code);
        self.by_code.insert(code, name.to_string());
    }

    /// Type code for a label; `0` when the label is not in the table.
    #[inline]
    pub fn code_of(&self, label: &[u8]) -> u16 {
        std::str::from_utf8(label)
            .ok()
            .and_then(|name| self.by_name.get(name).copied())
            .unwrap_or(0)
    }

    #[inline]
    pub fn name_of(&self, code: u16) -> Option<&str> {
        self.by_code.get(&code).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}

impl Default for IfcSchema {
    fn default() -> Self {
        Self::new()
    }
}
