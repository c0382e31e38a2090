//! PostgreSQL-backed recommendation store.
//!
//! Read-only: the hosted database is owned by the CRUD screens, this
//! side only runs `= ANY($1)` lookups against the recommendation tables. All reads
//! share one client; tokio-postgres pipelines concurrent queries on it.

use async_trait::async_trait;
use genrec_common::entities::*;
use tokio_postgres::types::ToSql;
use tokio_postgres::{Client, NoTls, Row};
use tracing::{error, info};
use uuid::Uuid;

use crate::error::{DbError, Result};
use crate::schema::*;
use crate::store::RecommendationStore;

pub struct PgStore {
    client: Client,
}

impl PgStore {
    /// Connect and spawn the connection driver task.
    pub async fn connect(url: &str) -> Result<Self> {
        let (client, connection) = tokio_postgres::connect(url, NoTls).await?;
        tokio::spawn(async move {
            if let Err(e) = connection.await {
                error!("PostgreSQL connection error: {e}");
            }
        });
        info!("Connected to PostgreSQL store");
        Ok(Self { client })
    }

    async fn rows(&self, table: &'static str, sql: &str, param: &(dyn ToSql + Sync)) -> Result<Vec<Row>> {
        self.client
            .query(sql, &[param])
            .await
            .map_err(|e| DbError::ReadFailed { table, message: e.to_string() })
    }
}

fn read_err(table: &'static str) -> impl Fn(tokio_postgres::Error) -> DbError {
    move |e| DbError::InvalidRow { table, message: e.to_string() }
}

fn sex_column(row: &Row, table: &'static str) -> Result<SexFilter> {
    let raw: Option<String> = row.try_get("sex").map_err(read_err(table))?;
    SexFilter::parse(raw.as_deref()).map_err(|e| DbError::InvalidRow { table, message: e.to_string() })
}

fn gene_from_row(row: &Row) -> Result<Gene> {
    let e = read_err(TABLE_GENES);
    Ok(Gene {
        id: row.try_get("id").map_err(&e)?,
        symbol: row.try_get("symbol").map_err(&e)?,
        name: row.try_get("name").map_err(&e)?,
        created_at: None,
    })
}

fn group_from_row(row: &Row) -> Result<RecommendationGroup> {
    let e = read_err(TABLE_GROUPS);
    Ok(RecommendationGroup {
        id: row.try_get("id").map_err(&e)?,
        gene_id: row.try_get("gene_id").map_err(&e)?,
        sex: sex_column(row, TABLE_GROUPS)?,
        age_min: row.try_get("age_min").map_err(&e)?,
        age_max: row.try_get("age_max").map_err(&e)?,
        recommendations: row.try_get("recommendations").map_err(&e)?,
        applies_to_all_classes: row
            .try_get::<_, Option<bool>>("applies_to_all_classes")
            .map_err(&e)?
            .unwrap_or(false),
        created_at: None,
    })
}

fn mutation_from_row(row: &Row) -> Result<Mutation> {
    let e = read_err(TABLE_MUTATIONS);
    let pathogenicity: String = row.try_get("pathogenicity").map_err(&e)?;
    Ok(Mutation {
        id: row.try_get("id").map_err(&e)?,
        gene_id: row.try_get("gene_id").map_err(&e)?,
        mutation: row.try_get("mutation").map_err(&e)?,
        pathogenicity: Pathogenicity::parse(&pathogenicity)
            .map_err(|err| DbError::InvalidRow { table: TABLE_MUTATIONS, message: err.to_string() })?,
        created_at: None,
    })
}

fn edge(row: &Row, table: &'static str, left: &str, right: &str) -> Result<(Uuid, Uuid)> {
    let e = read_err(table);
    Ok((row.try_get(left).map_err(&e)?, row.try_get(right).map_err(&e)?))
}

#[async_trait]
impl RecommendationStore for PgStore {
    async fn all_genes(&self) -> Result<Vec<Gene>> {
        let rows = self
            .client
            .query("SELECT id, symbol, name FROM genes", &[])
            .await
            .map_err(|e| DbError::ReadFailed { table: TABLE_GENES, message: e.to_string() })?;
        rows.iter().map(gene_from_row).collect()
    }

    async fn genes_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Gene>> {
        let rows = self
            .rows(TABLE_GENES, "SELECT id, symbol, name FROM genes WHERE id = ANY($1)", &ids)
            .await?;
        rows.iter().map(gene_from_row).collect()
    }

    async fn genes_by_symbols(&self, symbols: &[String]) -> Result<Vec<Gene>> {
        let upper: Vec<String> = symbols.iter().map(|s| s.trim().to_ascii_uppercase()).collect();
        let rows = self
            .rows(
                TABLE_GENES,
                "SELECT id, symbol, name FROM genes WHERE upper(trim(symbol)) = ANY($1)",
                &upper,
            )
            .await?;
        rows.iter().map(gene_from_row).collect()
    }

    async fn classes_by_genes(&self, gene_ids: &[Uuid]) -> Result<Vec<RecommendationClass>> {
        let rows = self
            .rows(
                TABLE_CLASSES,
                "SELECT id, gene_id, name FROM recommendation_classes WHERE gene_id = ANY($1)",
                &gene_ids,
            )
            .await?;
        let e = read_err(TABLE_CLASSES);
        rows.iter()
            .map(|row| {
                Ok(RecommendationClass {
                    id: row.try_get("id").map_err(&e)?,
                    gene_id: row.try_get("gene_id").map_err(&e)?,
                    name: row.try_get("name").map_err(&e)?,
                    created_at: None,
                })
            })
            .collect()
    }

    async fn groups_by_genes(&self, gene_ids: &[Uuid]) -> Result<Vec<RecommendationGroup>> {
        let rows = self
            .rows(
                TABLE_GROUPS,
                r#"
                SELECT id, gene_id, sex, age_min, age_max, recommendations, applies_to_all_classes
                FROM recommendation_groups
                WHERE gene_id = ANY($1)
                "#,
                &gene_ids,
            )
            .await?;
        rows.iter().map(group_from_row).collect()
    }

    async fn group_classes_by_groups(&self, group_ids: &[Uuid]) -> Result<Vec<GroupClassLink>> {
        let rows = self
            .rows(
                TABLE_GROUP_CLASSES,
                "SELECT group_id, class_id FROM recommendation_group_classes WHERE group_id = ANY($1)",
                &group_ids,
            )
            .await?;
        rows.iter()
            .map(|row| {
                let (group_id, class_id) = edge(row, TABLE_GROUP_CLASSES, "group_id", "class_id")?;
                Ok(GroupClassLink { group_id, class_id })
            })
            .collect()
    }

    async fn mutations_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Mutation>> {
        let rows = self
            .rows(
                TABLE_MUTATIONS,
                "SELECT id, gene_id, mutation, pathogenicity FROM gene_mutations WHERE id = ANY($1)",
                &ids,
            )
            .await?;
        rows.iter().map(mutation_from_row).collect()
    }

    async fn mutations_by_genes(&self, gene_ids: &[Uuid]) -> Result<Vec<Mutation>> {
        let rows = self
            .rows(
                TABLE_MUTATIONS,
                "SELECT id, gene_id, mutation, pathogenicity FROM gene_mutations WHERE gene_id = ANY($1)",
                &gene_ids,
            )
            .await?;
        rows.iter().map(mutation_from_row).collect()
    }

    async fn mutation_groups_by_mutations(&self, mutation_ids: &[Uuid]) -> Result<Vec<MutationGroupLink>> {
        let rows = self
            .rows(
                TABLE_MUTATION_GROUPS,
                "SELECT mutation_id, group_id FROM gene_mutation_groups WHERE mutation_id = ANY($1)",
                &mutation_ids,
            )
            .await?;
        rows.iter()
            .map(|row| {
                let (mutation_id, group_id) = edge(row, TABLE_MUTATION_GROUPS, "mutation_id", "group_id")?;
                Ok(MutationGroupLink { mutation_id, group_id })
            })
            .collect()
    }

    async fn mutation_classes_by_mutations(&self, mutation_ids: &[Uuid]) -> Result<Vec<MutationClassLink>> {
        let rows = self
            .rows(
                TABLE_MUTATION_CLASSES,
                "SELECT mutation_id, class_id FROM gene_mutation_classes WHERE mutation_id = ANY($1)",
                &mutation_ids,
            )
            .await?;
        rows.iter()
            .map(|row| {
                let (mutation_id, class_id) = edge(row, TABLE_MUTATION_CLASSES, "mutation_id", "class_id")?;
                Ok(MutationClassLink { mutation_id, class_id })
            })
            .collect()
    }

    async fn overrides_by_mutations(&self, mutation_ids: &[Uuid]) -> Result<Vec<MutationGroupOverride>> {
        let rows = self
            .rows(
                TABLE_OVERRIDES,
                r#"SELECT mutation_id, group_id, "override" FROM gene_mutation_group_overrides WHERE mutation_id = ANY($1)"#,
                &mutation_ids,
            )
            .await?;
        rows.iter()
            .map(|row| {
                let (mutation_id, group_id) = edge(row, TABLE_OVERRIDES, "mutation_id", "group_id")?;
                let raw: String = row.try_get("override").map_err(read_err(TABLE_OVERRIDES))?;
                let kind = OverrideKind::parse(&raw)
                    .map_err(|e| DbError::InvalidRow { table: TABLE_OVERRIDES, message: e.to_string() })?;
                Ok(MutationGroupOverride { mutation_id, group_id, kind })
            })
            .collect()
    }

    async fn risks_by_genes(&self, gene_ids: &[Uuid]) -> Result<Vec<Risk>> {
        let rows = self
            .rows(
                TABLE_RISKS,
                "SELECT id, gene_id, sex, risk FROM gene_risks WHERE gene_id = ANY($1)",
                &gene_ids,
            )
            .await?;
        let e = read_err(TABLE_RISKS);
        rows.iter()
            .map(|row| {
                Ok(Risk {
                    id: row.try_get("id").map_err(&e)?,
                    gene_id: row.try_get("gene_id").map_err(&e)?,
                    sex: sex_column(row, TABLE_RISKS)?,
                    risk: row.try_get("risk").map_err(&e)?,
                    created_at: None,
                })
            })
            .collect()
    }

    async fn cancer_recommendations_by_genes(&self, gene_ids: &[Uuid]) -> Result<Vec<CancerRecommendation>> {
        let rows = self
            .rows(
                TABLE_CANCER_RECOMMENDATIONS,
                r#"
                SELECT id, gene_id, sex, age_min, age_max, recommendations
                FROM gene_cancer_recommendations
                WHERE gene_id = ANY($1)
                "#,
                &gene_ids,
            )
            .await?;
        let e = read_err(TABLE_CANCER_RECOMMENDATIONS);
        rows.iter()
            .map(|row| {
                Ok(CancerRecommendation {
                    id: row.try_get("id").map_err(&e)?,
                    gene_id: row.try_get("gene_id").map_err(&e)?,
                    sex: sex_column(row, TABLE_CANCER_RECOMMENDATIONS)?,
                    age_min: row.try_get("age_min").map_err(&e)?,
                    age_max: row.try_get("age_max").map_err(&e)?,
                    recommendations: row.try_get("recommendations").map_err(&e)?,
                    created_at: None,
                })
            })
            .collect()
    }
}
