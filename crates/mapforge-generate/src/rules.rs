use mapforge_core::TableDescriptor;
use serde::Serialize;

/// Named capability flags derived from a table's shape and statement toggles.
///
/// Every flag is a pure function of the descriptor, so evaluating the same
/// table twice always yields an equal value. Model-only tables disable every
/// client-side flag but still produce the record class and its result map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Rules {
    pub insert: bool,
    pub insert_selective: bool,
    pub insert_multiple: bool,
    pub delete_by_primary_key: bool,
    pub delete_by_example: bool,
    pub select_by_primary_key: bool,
    pub select_by_example_without_blobs: bool,
    pub select_by_example_with_blobs: bool,
    pub count_by_example: bool,
    pub update_by_primary_key: bool,
    pub update_by_primary_key_selective: bool,
    pub update_by_primary_key_without_blobs: bool,
    pub update_by_primary_key_with_blobs: bool,
    pub update_by_example_without_blobs: bool,
    pub update_by_example_with_blobs: bool,
    pub update_by_example_selective: bool,
    pub base_result_map: bool,
    pub result_map_with_blobs: bool,
    pub base_column_list: bool,
    pub blob_column_list: bool,
    pub base_record_class: bool,
    pub java_client: bool,
}

impl Rules {
    pub fn evaluate(table: &TableDescriptor) -> Self {
        let toggles = table.statements();
        let model_only = table.is_model_only();
        let client = !model_only;

        let has_pk = table.has_primary_key_columns();
        let has_base = table.has_base_columns();
        let has_blob = table.has_blob_columns();
        let has_updatable_columns = table
            .non_primary_key_columns()
            .iter()
            .any(|column| !column.generated_always);
        let any_select = toggles.select_by_example || toggles.select_by_primary_key;

        let insert = client && toggles.insert;
        let select_by_primary_key =
            client && toggles.select_by_primary_key && has_pk && (has_base || has_blob);
        let select_by_example_without_blobs = client && toggles.select_by_example;
        let update_by_primary_key =
            client && toggles.update_by_primary_key && has_pk && has_updatable_columns;

        Self {
            insert,
            insert_selective: insert,
            insert_multiple: insert && multiple_row_insert_allowed(table),
            delete_by_primary_key: client && toggles.delete_by_primary_key && has_pk,
            delete_by_example: client && toggles.delete_by_example,
            select_by_primary_key,
            select_by_example_without_blobs,
            select_by_example_with_blobs: select_by_example_without_blobs && has_blob,
            count_by_example: client && toggles.count_by_example,
            update_by_primary_key,
            update_by_primary_key_selective: update_by_primary_key,
            update_by_primary_key_without_blobs: update_by_primary_key && has_base,
            update_by_primary_key_with_blobs: update_by_primary_key && has_blob,
            update_by_example_without_blobs: client
                && toggles.update_by_example
                && (has_pk || has_base),
            update_by_example_with_blobs: client && toggles.update_by_example && has_blob,
            update_by_example_selective: client && toggles.update_by_example,
            base_result_map: model_only || any_select,
            result_map_with_blobs: has_blob && (model_only || any_select),
            base_column_list: select_by_primary_key || select_by_example_without_blobs,
            blob_column_list: has_blob && client && any_select,
            base_record_class: true,
            java_client: client,
        }
    }

    /// Any flavor of select-by-example is enabled.
    pub fn select_by_example(&self) -> bool {
        self.select_by_example_without_blobs || self.select_by_example_with_blobs
    }

    /// Any flavor of update-by-example is enabled.
    pub fn update_by_example(&self) -> bool {
        self.update_by_example_without_blobs || self.update_by_example_with_blobs
    }

    /// The basic select-one provider method is needed.
    pub fn basic_select_one(&self) -> bool {
        self.select_by_example() || self.select_by_primary_key
    }

    /// The basic delete provider method is needed.
    pub fn basic_delete(&self) -> bool {
        self.delete_by_example || self.delete_by_primary_key
    }

    /// The basic update provider method is needed.
    pub fn basic_update(&self) -> bool {
        self.update_by_example()
            || self.update_by_example_selective
            || self.update_by_primary_key
    }
}

/// Multi-row insert can report keys only when there is no key or the driver
/// returns them; a custom SELECT cannot be run once per batched row.
pub fn multiple_row_insert_allowed(table: &TableDescriptor) -> bool {
    let strategy_allows = table
        .generated_key()
        .map(|key| key.is_jdbc_standard())
        .unwrap_or(true);
    strategy_allows && table.statements().insert_multiple != Some(false)
}

/// Multi-row insert was asked for explicitly but the key strategy rules it out.
pub fn multiple_row_insert_conflict(table: &TableDescriptor) -> bool {
    table.statements().insert_multiple == Some(true)
        && table
            .generated_key()
            .is_some_and(|key| !key.is_jdbc_standard())
}
