use sea_query::{ColumnDef, Expr as SeaExpr, Func as SeaFunc, Iden, Index, Order as SeaOrder, PostgresQueryBuilder, Query as SeaQuery, Table};
use sea_query_binder::SqlxBinder;
use sqlx::{Error as DbError, Row, postgres::PgRow};
use tokio::runtime::Handle;
use tracing::trace;

use crate::{
    NodeherdError, Result,
    model::Node,
    store::{NodeStore, map_db_err},
    utils,
};

use super::{DbRow, synclient::SynClient};

/// Nodes persisted in a `nodes` table, one JSON document per row. The id,
/// spec id and status are mirrored into columns for lookup.
#[derive(Debug)]
pub struct PostgresStore {
    conn: SynClient,
}

#[derive(Iden)]
#[iden = "nodes"]
enum CollectionIden {
    Table,

    Id,
    SpecId,
    Status,
    Data,
    CreateTime,
    UpdateTime,
}

impl PostgresStore {
    /// Connects and creates the `nodes` table if it is missing.
    pub fn new(
        db_url: &str,
        runtime: Handle,
    ) -> Result<Self> {
        let conn = SynClient::connect(db_url, runtime).map_err(map_db_err)?;
        let store = Self {
            conn,
        };
        store.init()?;
        Ok(store)
    }

    fn init(&self) -> Result<()> {
        let sql = [
            Table::create()
                .table(CollectionIden::Table)
                .if_not_exists()
                .col(ColumnDef::new(CollectionIden::Id).string().not_null().primary_key())
                .col(ColumnDef::new(CollectionIden::SpecId).string().not_null())
                .col(ColumnDef::new(CollectionIden::Status).string().not_null())
                .col(ColumnDef::new(CollectionIden::Data).text().not_null())
                .col(ColumnDef::new(CollectionIden::CreateTime).big_integer().default(0))
                .col(ColumnDef::new(CollectionIden::UpdateTime).big_integer().default(0))
                .build(PostgresQueryBuilder),
            Index::create().name("idx_nodes_spec_id").if_not_exists().table(CollectionIden::Table).col(CollectionIden::SpecId).build(PostgresQueryBuilder),
        ];

        self.conn.batch_execute(&sql).map_err(map_db_err)
    }
}

impl NodeStore for PostgresStore {
    fn exists(
        &self,
        id: &str,
    ) -> Result<bool> {
        let (sql, values) = SeaQuery::select()
            .from(CollectionIden::Table)
            .expr(SeaFunc::count(SeaExpr::col(CollectionIden::Id)))
            .and_where(SeaExpr::col(CollectionIden::Id).eq(id))
            .build_sqlx(PostgresQueryBuilder);

        let count = self.conn.query_one(sql.as_str(), values).and_then(|row| row.try_get::<i64, usize>(0)).map_err(map_db_err)?;

        Ok(count > 0)
    }

    fn find(
        &self,
        id: &str,
    ) -> Result<Node> {
        let (sql, values) = SeaQuery::select()
            .from(CollectionIden::Table)
            .column(CollectionIden::Data)
            .and_where(SeaExpr::col(CollectionIden::Id).eq(id))
            .build_sqlx(PostgresQueryBuilder);

        match self.conn.query_optional(&sql, values).map_err(map_db_err)? {
            Some(row) => Node::from_row(&row).map_err(map_db_err),
            None => Err(NodeherdError::NotFound(id.to_string())),
        }
    }

    fn find_by_spec_id(
        &self,
        spec_id: &str,
    ) -> Result<Option<Node>> {
        let (sql, values) = SeaQuery::select()
            .from(CollectionIden::Table)
            .column(CollectionIden::Data)
            .and_where(SeaExpr::col(CollectionIden::SpecId).eq(spec_id))
            .order_by(CollectionIden::CreateTime, SeaOrder::Asc)
            .limit(1)
            .build_sqlx(PostgresQueryBuilder);

        self.conn.query_optional(&sql, values).map_err(map_db_err)?.map(|row| Node::from_row(&row).map_err(map_db_err)).transpose()
    }

    fn list(&self) -> Result<Vec<Node>> {
        let (sql, values) = SeaQuery::select()
            .from(CollectionIden::Table)
            .column(CollectionIden::Data)
            .order_by(CollectionIden::CreateTime, SeaOrder::Asc)
            .order_by(CollectionIden::Id, SeaOrder::Asc)
            .build_sqlx(PostgresQueryBuilder);

        self.conn.query(&sql, values).map_err(map_db_err)?.iter().map(|row| Node::from_row(row).map_err(map_db_err)).collect()
    }

    fn create(
        &self,
        node: &Node,
    ) -> Result<bool> {
        trace!("postgres::create({})", node.id);
        let data = serde_json::to_string(node)?;
        let (sql, sql_values) = SeaQuery::insert()
            .into_table(CollectionIden::Table)
            .columns([
                CollectionIden::Id,
                CollectionIden::SpecId,
                CollectionIden::Status,
                CollectionIden::Data,
                CollectionIden::CreateTime,
                CollectionIden::UpdateTime,
            ])
            .values([
                node.id.clone().into(),
                node.spec.spec_id.clone().into(),
                node.status.as_ref().into(),
                data.into(),
                node.created_timestamp_ms.into(),
                utils::time::time_millis().into(),
            ])
            .map_err(map_db_err)?
            .build_sqlx(PostgresQueryBuilder);

        let result = self.conn.execute(sql.as_str(), sql_values).map_err(map_db_err)?;
        Ok(result.rows_affected() > 0)
    }

    fn update(
        &self,
        node: &Node,
    ) -> Result<bool> {
        trace!("postgres::update({}, {})", node.id, node.status);
        let data = serde_json::to_string(node)?;
        let (sql, sql_values) = SeaQuery::update()
            .table(CollectionIden::Table)
            .values([
                (CollectionIden::SpecId, node.spec.spec_id.clone().into()),
                (CollectionIden::Status, node.status.as_ref().into()),
                (CollectionIden::Data, data.into()),
                (CollectionIden::UpdateTime, utils::time::time_millis().into()),
            ])
            .and_where(SeaExpr::col(CollectionIden::Id).eq(node.id()))
            .build_sqlx(PostgresQueryBuilder);

        let result = self.conn.execute(sql.as_str(), sql_values).map_err(map_db_err)?;
        if result.rows_affected() == 0 {
            return Err(NodeherdError::NotFound(node.id.clone()));
        }
        Ok(true)
    }

    fn delete(
        &self,
        id: &str,
    ) -> Result<Node> {
        trace!("postgres::delete({})", id);
        let (sql, values) = SeaQuery::delete()
            .from_table(CollectionIden::Table)
            .and_where(SeaExpr::col(CollectionIden::Id).eq(id))
            .returning_col(CollectionIden::Data)
            .build_sqlx(PostgresQueryBuilder);

        match self.conn.query_optional(&sql, values).map_err(map_db_err)? {
            Some(row) => Node::from_row(&row).map_err(map_db_err),
            None => Err(NodeherdError::NotFound(id.to_string())),
        }
    }
}

impl DbRow for Node {
    fn id(&self) -> &str {
        &self.id
    }

    fn from_row(row: &PgRow) -> std::result::Result<Self, DbError>
    where
        Self: Sized,
    {
        let data: String = row.try_get("data")?;
        serde_json::from_str(&data).map_err(|e| DbError::Decode(Box::new(e)))
    }
}
