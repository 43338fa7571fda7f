//! An [`AuthorityTable`] kept in SQLite, laid out like the GeoPackage
//! `gpkg_spatial_ref_sys` table.
use crate::authority::{defaults, AuthorityTable, SpatialRefSys};
use crate::result::{sqlite, Error, Result};
use crate::srs::SpatialReference;
use log::{debug, warn};
use rusqlite::{params, Connection, OpenFlags, OptionalExtension};
use std::path::Path;

const CREATE_SPATIAL_REF_SYS_TABLE: &str = "CREATE TABLE gpkg_spatial_ref_sys (
        srs_name TEXT NOT NULL,
        srs_id INTEGER NOT NULL PRIMARY KEY,
        organization TEXT NOT NULL,
        organization_coordsys_id INTEGER NOT NULL,
        definition TEXT NOT NULL,
        description TEXT NOT NULL
    );";

const TABLE_EXISTS: &str =
    "SELECT count(*) FROM sqlite_master WHERE type = 'table' AND name = 'gpkg_spatial_ref_sys'";

/// Definitions read from a `gpkg_spatial_ref_sys` table. Works on a GeoPackage as
/// well as on a database holding only that table.
#[derive(Debug)]
pub struct GpkgAuthority {
    conn: Connection,
}

impl GpkgAuthority {
    /// Creates the database with the table and the three rows every GeoPackage
    /// starts with: WGS 84 and the undefined geographic and cartesian systems.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path).map_err(sqlite)?;
        Self::initialize(conn)
    }

    pub fn create_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(sqlite)?;
        Self::initialize(conn)
    }

    fn initialize(conn: Connection) -> Result<Self> {
        conn.execute(CREATE_SPATIAL_REF_SYS_TABLE, []).map_err(sqlite)?;
        let table = GpkgAuthority { conn };
        table.insert(&defaults::WGS84)?;
        table.insert(&defaults::CARTESIAN)?;
        table.insert(&defaults::GEOGRAPHIC)?;
        Ok(table)
    }

    /// Opens an existing database read only.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY)
            .map_err(sqlite)?;
        let found: i64 = conn
            .query_row(TABLE_EXISTS, [], |row| row.get(0))
            .map_err(sqlite)?;
        if found == 0 {
            return Err(Error::AuthorityError(
                "database has no gpkg_spatial_ref_sys table".to_owned(),
            ));
        }
        Ok(GpkgAuthority { conn })
    }

    pub fn insert(&self, srs: &SpatialRefSys) -> Result<()> {
        const STMT: &str = "INSERT INTO gpkg_spatial_ref_sys VALUES (?1, ?2, ?3, ?4, ?5, ?6)";
        self.conn
            .execute(
                STMT,
                params![
                    srs.name,
                    srs.id,
                    srs.organization,
                    srs.organization_coordsys_id,
                    srs.definition,
                    srs.description,
                ],
            )
            .map_err(sqlite)?;
        debug!("stored {}:{} as srs_id {}", srs.organization, srs.organization_coordsys_id, srs.id);
        Ok(())
    }

    /// Stores `srs` under `organization:code`, using the code as `srs_id`. The row
    /// takes its name from the root node.
    pub fn insert_srs(
        &self,
        srs: &SpatialReference,
        organization: &str,
        code: i64,
        description: &str,
    ) -> Result<()> {
        let definition = srs.to_wkt()?;
        self.insert(&SpatialRefSys {
            name: srs.name().unwrap_or("unnamed"),
            id: code,
            organization,
            organization_coordsys_id: code,
            definition: &definition,
            description,
        })
    }

    /// Every `(organization, code)` in the table, in `srs_id` order.
    pub fn codes(&self) -> Result<Vec<(String, i64)>> {
        let mut stmt = self
            .conn
            .prepare("SELECT organization, organization_coordsys_id FROM gpkg_spatial_ref_sys ORDER BY srs_id")
            .map_err(sqlite)?;
        let rows = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))
            .map_err(sqlite)?;
        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(sqlite)
    }

    /// Builds the definition stored under `srs_id`.
    pub fn by_srs_id(&self, srs_id: i64) -> Result<Option<SpatialReference>> {
        let row: Option<(String, String)> = self
            .conn
            .query_row(
                "SELECT srs_name, definition FROM gpkg_spatial_ref_sys WHERE srs_id = ?1",
                params![srs_id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()
            .map_err(sqlite)?;
        match row {
            Some((name, definition)) => to_srs(&name, srs_id, &definition).map(Some),
            None => Ok(None),
        }
    }

    pub fn close(self) -> Result<()> {
        self.conn.close().map_err(|(_, err)| sqlite(err))
    }
}

fn to_srs(name: &str, id: i64, definition: &str) -> Result<SpatialReference> {
    SpatialRefSys {
        name,
        id,
        organization: "",
        organization_coordsys_id: id,
        definition,
        description: "",
    }
    .to_srs()
}

impl AuthorityTable for GpkgAuthority {
    fn definition(&self, authority: &str, code: i64) -> Result<Option<String>> {
        let row: Option<(String, String)> = self
            .conn
            .query_row(
                "SELECT srs_name, definition FROM gpkg_spatial_ref_sys \
                 WHERE organization = ?1 COLLATE NOCASE AND organization_coordsys_id = ?2",
                params![authority, code],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()
            .map_err(sqlite)?;
        match row {
            Some((name, definition)) if definition.eq_ignore_ascii_case("undefined") => {
                Err(Error::AuthorityError(format!("{} has no definition", name)))
            }
            Some((_, definition)) => Ok(Some(definition)),
            None => Ok(None),
        }
    }

    fn identify(&self, srs: &SpatialReference) -> Result<Option<(String, i64)>> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT srs_name, organization, organization_coordsys_id, definition \
                 FROM gpkg_spatial_ref_sys ORDER BY srs_id",
            )
            .map_err(sqlite)?;
        let mut rows = stmt.query([]).map_err(sqlite)?;
        while let Some(row) = rows.next().map_err(sqlite)? {
            let name: String = row.get(0).map_err(sqlite)?;
            let organization: String = row.get(1).map_err(sqlite)?;
            let code: i64 = row.get(2).map_err(sqlite)?;
            let definition: String = row.get(3).map_err(sqlite)?;
            if definition.eq_ignore_ascii_case("undefined") {
                continue;
            }
            match SpatialReference::from_wkt(&definition) {
                Ok(candidate) if candidate.is_same(srs) => return Ok(Some((organization, code))),
                Ok(_) => {}
                Err(err) => warn!("skipping {}: {}", name, err),
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn create_holds_the_defaults() {
        let dir = tempdir().unwrap();
        let filename = dir.path().join("srs.gpkg");
        GpkgAuthority::create(&filename).unwrap().close().unwrap();

        let table = GpkgAuthority::open(&filename).unwrap();
        assert_eq!(
            table.codes().unwrap(),
            vec![("NONE".to_owned(), -1), ("NONE".to_owned(), 0), ("EPSG".to_owned(), 4326)]
        );
        let srs = SpatialReference::from_epsg_with(&table, 4326).unwrap();
        assert!(srs.is_same(&SpatialReference::from_epsg(4326).unwrap()));
        assert!(table.by_srs_id(4326).unwrap().unwrap().is_geographic());
        assert!(table.by_srs_id(7).unwrap().is_none());
    }

    #[test]
    fn undefined_rows_are_errors() {
        let table = GpkgAuthority::create_in_memory().unwrap();
        assert!(matches!(table.definition("NONE", 0), Err(Error::AuthorityError(_))));
        assert!(matches!(table.by_srs_id(-1), Err(Error::AuthorityError(_))));
        assert_eq!(table.definition("EPSG", 32633).unwrap(), None);
        assert!(SpatialReference::from_epsg_with(&table, 32633).is_err());
    }

    #[test]
    fn inserted_definitions_resolve_and_identify() {
        let table = GpkgAuthority::create_in_memory().unwrap();
        let utm = SpatialReference::from_epsg(32633).unwrap();
        table.insert_srs(&utm, "EPSG", 32633, "UTM zone 33N").unwrap();
        assert!(table.definition("epsg", 32633).unwrap().is_some());

        let mut built = SpatialReference::from_epsg(4326).unwrap();
        built.set_utm(33, true).unwrap();
        assert_eq!(
            built.auto_identify_with(&table).unwrap(),
            Some(("EPSG".to_owned(), 32633))
        );
        assert_eq!(built.authority_code(None).as_deref(), Some("32633"));

        let geog = SpatialReference::from_epsg(4267).unwrap();
        assert_eq!(table.identify(&geog).unwrap(), None);
    }

    #[test]
    fn duplicate_ids_are_database_errors() {
        let table = GpkgAuthority::create_in_memory().unwrap();
        assert!(matches!(table.insert(&defaults::WGS84), Err(Error::DatabaseError(_))));
    }

    #[test]
    fn open_needs_the_table() {
        let dir = tempdir().unwrap();
        let filename = dir.path().join("empty.db");
        rusqlite::Connection::open(&filename)
            .unwrap()
            .execute("CREATE TABLE other (x INTEGER)", [])
            .unwrap();
        assert!(matches!(GpkgAuthority::open(&filename), Err(Error::AuthorityError(_))));
    }
}
