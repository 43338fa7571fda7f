//! WKT spellings of projection methods and parameters.

pub mod proj {
    pub const ALBERS_CONIC_EQUAL_AREA: &str = "Albers_Conic_Equal_Area";
    pub const AZIMUTHAL_EQUIDISTANT: &str = "Azimuthal_Equidistant";
    pub const BONNE: &str = "Bonne";
    pub const CYLINDRICAL_EQUAL_AREA: &str = "Cylindrical_Equal_Area";
    pub const CASSINI_SOLDNER: &str = "Cassini_Soldner";
    pub const EQUIDISTANT_CONIC: &str = "Equidistant_Conic";
    pub const ECKERT_I: &str = "Eckert_I";
    pub const ECKERT_II: &str = "Eckert_II";
    pub const ECKERT_III: &str = "Eckert_III";
    pub const ECKERT_IV: &str = "Eckert_IV";
    pub const ECKERT_V: &str = "Eckert_V";
    pub const ECKERT_VI: &str = "Eckert_VI";
    pub const EQUIRECTANGULAR: &str = "Equirectangular";
    pub const GALL_STEREOGRAPHIC: &str = "Gall_Stereographic";
    pub const GAUSS_SCHREIBER_TM: &str = "Gauss_Schreiber_Transverse_Mercator";
    pub const GEOSTATIONARY_SATELLITE: &str = "Geostationary_Satellite";
    pub const GOODE_HOMOLOSINE: &str = "Goode_Homolosine";
    pub const INTERRUPTED_GOODE_HOMOLOSINE: &str = "Interrupted_Goode_Homolosine";
    pub const GNOMONIC: &str = "Gnomonic";
    pub const HOTINE_OBLIQUE_MERCATOR: &str = "Hotine_Oblique_Mercator";
    pub const HOTINE_OBLIQUE_MERCATOR_AZIMUTH_CENTER: &str =
        "Hotine_Oblique_Mercator_Azimuth_Center";
    pub const HOTINE_OBLIQUE_MERCATOR_TWO_POINT: &str =
        "Hotine_Oblique_Mercator_Two_Point_Natural_Origin";
    pub const IMW_POLYCONIC: &str = "International_Map_of_the_World_Polyconic";
    pub const KROVAK: &str = "Krovak";
    pub const LAMBERT_AZIMUTHAL_EQUAL_AREA: &str = "Lambert_Azimuthal_Equal_Area";
    pub const LAMBERT_CONFORMAL_CONIC_1SP: &str = "Lambert_Conformal_Conic_1SP";
    pub const LAMBERT_CONFORMAL_CONIC_2SP: &str = "Lambert_Conformal_Conic_2SP";
    pub const LAMBERT_CONFORMAL_CONIC_2SP_BELGIUM: &str = "Lambert_Conformal_Conic_2SP_Belgium";
    pub const MILLER_CYLINDRICAL: &str = "Miller_Cylindrical";
    pub const MERCATOR_1SP: &str = "Mercator_1SP";
    pub const MERCATOR_2SP: &str = "Mercator_2SP";
    pub const MOLLWEIDE: &str = "Mollweide";
    pub const NEW_ZEALAND_MAP_GRID: &str = "New_Zealand_Map_Grid";
    pub const OBLIQUE_STEREOGRAPHIC: &str = "Oblique_Stereographic";
    pub const ORTHOGRAPHIC: &str = "Orthographic";
    pub const POLYCONIC: &str = "Polyconic";
    pub const POLAR_STEREOGRAPHIC: &str = "Polar_Stereographic";
    pub const ROBINSON: &str = "Robinson";
    pub const SINUSOIDAL: &str = "Sinusoidal";
    pub const STEREOGRAPHIC: &str = "Stereographic";
    pub const SWISS_OBLIQUE_CYLINDRICAL: &str = "Swiss_Oblique_Cylindrical";
    pub const TRANSVERSE_MERCATOR: &str = "Transverse_Mercator";
    pub const TRANSVERSE_MERCATOR_SOUTH_ORIENTED: &str = "Transverse_Mercator_South_Orientated";
    pub const TUNISIA_MINING_GRID: &str = "Tunisia_Mining_Grid";
    pub const TWO_POINT_EQUIDISTANT: &str = "Two_Point_Equidistant";
    pub const VAN_DER_GRINTEN: &str = "VanDerGrinten";
}

pub mod param {
    pub const CENTRAL_MERIDIAN: &str = "central_meridian";
    pub const SCALE_FACTOR: &str = "scale_factor";
    pub const STANDARD_PARALLEL_1: &str = "standard_parallel_1";
    pub const STANDARD_PARALLEL_2: &str = "standard_parallel_2";
    pub const PSEUDO_STANDARD_PARALLEL_1: &str = "pseudo_standard_parallel_1";
    pub const LONGITUDE_OF_CENTER: &str = "longitude_of_center";
    pub const LATITUDE_OF_CENTER: &str = "latitude_of_center";
    pub const LATITUDE_OF_ORIGIN: &str = "latitude_of_origin";
    pub const FALSE_EASTING: &str = "false_easting";
    pub const FALSE_NORTHING: &str = "false_northing";
    pub const AZIMUTH: &str = "azimuth";
    pub const LONGITUDE_OF_POINT_1: &str = "longitude_of_point_1";
    pub const LATITUDE_OF_POINT_1: &str = "latitude_of_point_1";
    pub const LONGITUDE_OF_POINT_2: &str = "longitude_of_point_2";
    pub const LATITUDE_OF_POINT_2: &str = "latitude_of_point_2";
    pub const RECTIFIED_GRID_ANGLE: &str = "rectified_grid_angle";
    pub const SATELLITE_HEIGHT: &str = "satellite_height";
    pub const LATITUDE_OF_1ST_POINT: &str = "latitude_of_1st_point";
    pub const LONGITUDE_OF_1ST_POINT: &str = "longitude_of_1st_point";
    pub const LATITUDE_OF_2ND_POINT: &str = "latitude_of_2nd_point";
    pub const LONGITUDE_OF_2ND_POINT: &str = "longitude_of_2nd_point";
}
