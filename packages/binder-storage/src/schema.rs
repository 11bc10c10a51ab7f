pub fn render_schema() -> String {
	let init = include_str!("../../../sql/init.sql");

	expand_includes(init)
}

fn expand_includes(sql: &str) -> String {
	let mut out = String::new();

	for line in sql.lines() {
		let trimmed = line.trim();

		if let Some(path) = trimmed.strip_prefix("\\ir ") {
			match path.trim() {
				"tables/001_principals.sql" =>
					out.push_str(include_str!("../../../sql/tables/001_principals.sql")),
				"tables/002_collections.sql" =>
					out.push_str(include_str!("../../../sql/tables/002_collections.sql")),
				"tables/003_collection_collaborators.sql" => out.push_str(include_str!(
					"../../../sql/tables/003_collection_collaborators.sql"
				)),
				"tables/004_notes.sql" =>
					out.push_str(include_str!("../../../sql/tables/004_notes.sql")),
				"tables/005_note_collaborators.sql" =>
					out.push_str(include_str!("../../../sql/tables/005_note_collaborators.sql")),
				"tables/006_view_cache.sql" =>
					out.push_str(include_str!("../../../sql/tables/006_view_cache.sql")),
				_ => out.push_str(line),
			}
		} else {
			out.push_str(line);
		}

		out.push('\n');
	}

	out
}
