use super::ui;
use crate::core::catalog::{Catalog, CatalogStore, ChoiceOption, RateCategory, RateTable};
use comfy_table::Cell;

fn regions_table(catalog: &Catalog) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Region"),
        ui::header_cell("ID"),
        ui::header_cell("Multiplier"),
    ]);
    for region in catalog.regions.values() {
        table.add_row(vec![
            Cell::new(&region.name),
            Cell::new(&region.id),
            ui::number_cell(ui::format_multiplier(region.multiplier)),
        ]);
    }
    table.to_string()
}

fn roles_table(catalog: &Catalog, category: RateCategory) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Role"),
        ui::header_cell("ID"),
        ui::header_cell("Base Rate (AED)"),
    ]);
    for role in catalog.roles_by_category(category) {
        table.add_row(vec![
            Cell::new(&role.name),
            Cell::new(&role.id),
            ui::number_cell(role.base_rate.to_string()),
        ]);
    }
    table.to_string()
}

fn seniority_table(catalog: &Catalog) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Seniority"),
        ui::header_cell("ID"),
        ui::header_cell("Multiplier"),
    ]);
    for level in catalog.seniority_levels.values() {
        table.add_row(vec![
            Cell::new(&level.name),
            Cell::new(&level.id),
            ui::number_cell(ui::format_multiplier(level.multiplier)),
        ]);
    }
    table.to_string()
}

pub fn currencies_table(store: &CatalogStore) -> String {
    let base = store.base_currency();
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Currency"),
        ui::header_cell("ID"),
        ui::header_cell("Symbol"),
        ui::header_cell(&format!("Rate (per 1 {base})")),
    ]);
    for (currency, rate) in store.currencies() {
        let rate_cell = rate.map_or_else(
            || ui::number_cell(ui::style_text("N/A", ui::StyleType::Subtle)),
            |r| ui::number_cell(format!("{r:.4}")),
        );
        table.add_row(vec![
            Cell::new(&currency.name),
            Cell::new(&currency.id),
            Cell::new(&currency.symbol),
            rate_cell,
        ]);
    }
    table.to_string()
}

fn options_line(label: &str, options: &[ChoiceOption]) -> String {
    let values: Vec<&str> = options.iter().map(|o| o.label.as_str()).collect();
    format!("{}: {}", ui::style_text(label, ui::StyleType::TotalLabel), values.join(", "))
}

pub fn rates_updated_line(table: &RateTable) -> String {
    ui::style_text(
        &format!(
            "Base currency {} (updated {})",
            table.base_currency,
            table.updated_at.format("%Y-%m-%d %H:%M UTC")
        ),
        ui::StyleType::Subtle,
    )
}

pub fn render(store: &CatalogStore) -> String {
    let catalog = store.catalog();
    let sections = [
        ("Regions", regions_table(catalog)),
        ("Custom Resource Roles", roles_table(catalog, RateCategory::Custom)),
        ("SWAT Team Roles", roles_table(catalog, RateCategory::Swat)),
        ("Seniority Levels", seniority_table(catalog)),
        ("Currencies", currencies_table(store)),
    ];

    let mut output = String::new();
    for (title, table) in sections {
        let title = ui::style_text(title, ui::StyleType::Title);
        output.push_str(&format!("{title}\n\n{table}\n\n"));
    }
    output.push_str(&rates_updated_line(&store.rate_table()));
    output.push('\n');
    output.push_str(&options_line("Workload", &catalog.workload_options));
    output.push('\n');
    output.push_str(&options_line("Duration", &catalog.duration_options));
    output
}

pub fn run(store: &CatalogStore) {
    println!("{}", render(store));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_lists_reference_data() {
        let store = CatalogStore::new(Catalog::seeded(), RateTable::fallback());
        let output = render(&store);
        assert!(output.contains("Middle East"));
        assert!(output.contains("Frontend Developer"));
        assert!(output.contains("SWAT Full-Stack Engineer"));
        assert!(output.contains("Rate (per 1 AED)"));
        assert!(output.contains("0.2700"));
        assert!(output.contains("3 months"));
    }
}
