//! Tests for DDL parsing into the schema model.

use db_diagram::schema::{
    parse_reader, parse_sql, split_table_body, Dialect, Schema, SchemaBuilder,
};

fn pg(sql: &str) -> Schema {
    parse_sql(sql, Dialect::Postgresql)
}

mod create_table_tests {
    use super::*;

    #[test]
    fn test_simple_table() {
        let schema = pg(r#"
            CREATE TABLE users (
                id SERIAL PRIMARY KEY,
                name VARCHAR(100) NOT NULL
            );
        "#);

        assert_eq!(schema.len(), 1);
        let users = &schema.tables[0];
        assert_eq!(users.name, "users");
        assert_eq!(users.schema, None);
        assert_eq!(users.columns.len(), 2);
        assert_eq!(users.columns[0].name, "id");
        assert!(users.columns[0].primary_key);
        assert!(!users.columns[0].nullable);
        assert_eq!(users.columns[1].col_type, "VARCHAR(100)");
        assert!(!users.columns[1].nullable);
        assert_eq!(users.primary_key, Some(vec!["id".to_string()]));
    }

    #[test]
    fn test_schema_qualified_names() {
        let schema = pg(r#"
            CREATE TABLE public.users (id SERIAL PRIMARY KEY);
            CREATE TABLE audit.users (id SERIAL PRIMARY KEY);
        "#);

        assert_eq!(schema.len(), 2);
        assert_eq!(schema.tables[0].name, "users");
        assert_eq!(schema.tables[0].schema.as_deref(), Some("public"));
        assert_eq!(schema.tables[1].name, "users");
        assert_eq!(schema.tables[1].schema.as_deref(), Some("audit"));
        assert!(schema.get_table("audit.users").is_some());
    }

    #[test]
    fn test_quoted_identifiers_and_modifiers() {
        let schema = pg(r#"
            CREATE UNLOGGED TABLE IF NOT EXISTS "sales"."Order Items" (
                "Item Id" BIGINT NOT NULL,
                price NUMERIC(10,2) DEFAULT 0,
                tags TEXT[],
                placed_at TIMESTAMP WITH TIME ZONE DEFAULT now(),
                ratio DOUBLE PRECISION,
                code CHARACTER VARYING(20)
            );
        "#);

        let table = &schema.tables[0];
        assert_eq!(table.name, "Order Items");
        assert_eq!(table.schema.as_deref(), Some("sales"));

        let types: Vec<&str> = table.columns.iter().map(|c| c.col_type.as_str()).collect();
        assert_eq!(
            types,
            vec![
                "BIGINT",
                "NUMERIC(10, 2)",
                "TEXT[]",
                "TIMESTAMP WITH TIME ZONE",
                "DOUBLE PRECISION",
                "CHARACTER VARYING(20)",
            ]
        );
        assert_eq!(table.columns[0].name, "Item Id");
        assert_eq!(table.columns[1].default_value.as_deref(), Some("0"));
        assert_eq!(table.columns[3].default_value.as_deref(), Some("now()"));
    }

    #[test]
    fn test_duplicate_table_ignored() {
        let schema = pg(r#"
            CREATE TABLE users (id INT);
            CREATE TABLE users (id INT, email TEXT);
        "#);
        assert_eq!(schema.len(), 1);
        assert_eq!(schema.tables[0].columns.len(), 1);
    }

    #[test]
    fn test_composite_primary_key() {
        let schema = pg(r#"
            CREATE TABLE memberships (
                user_id INT,
                group_id INT,
                CONSTRAINT pk_memberships PRIMARY KEY (user_id, group_id)
            );
        "#);

        let table = &schema.tables[0];
        assert_eq!(
            table.primary_key,
            Some(vec!["user_id".to_string(), "group_id".to_string()])
        );
        assert!(table.columns.iter().all(|c| c.primary_key && !c.nullable));
    }

    #[test]
    fn test_non_ddl_statements_ignored() {
        let schema = pg(r#"
            SET search_path = public;
            INSERT INTO users VALUES (1, 'a;b');
            CREATE TABLE users (id INT);
            DROP TABLE IF EXISTS old_users;
        "#);
        assert_eq!(schema.len(), 1);
    }

    #[test]
    fn test_columns_named_like_constraint_keywords() {
        let schema = pg(r#"
            CREATE TABLE settings (
                id INT PRIMARY KEY,
                key VARCHAR(50) NOT NULL,
                index INT,
                unique_code TEXT UNIQUE,
                value TEXT
            );
        "#);

        let settings = &schema.tables[0];
        let names: Vec<&str> = settings.columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["id", "key", "index", "unique_code", "value"]);
        assert_eq!(settings.get_column("key").unwrap().col_type, "VARCHAR(50)");
        assert!(!settings.get_column("key").unwrap().nullable);
        assert_eq!(settings.get_column("index").unwrap().col_type, "INT");
        assert!(settings.get_column("unique_code").unwrap().unique);
        assert!(settings.indexes.is_empty());
    }

    #[test]
    fn test_constraint_prefixed_column_keeps_reference() {
        let schema = pg(r#"
            CREATE TABLE rules (
                id INT PRIMARY KEY,
                constraint_id INT REFERENCES constraints(id),
                check_count INT,
                CONSTRAINT rules_count_positive CHECK (check_count >= 0)
            );
        "#);

        let rules = &schema.tables[0];
        let names: Vec<&str> = rules.columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["id", "constraint_id", "check_count"]);
        assert_eq!(rules.foreign_keys.len(), 1);
        assert_eq!(rules.foreign_keys[0].columns, vec!["constraint_id"]);
        assert_eq!(rules.foreign_keys[0].referenced_table, "constraints");
    }

    #[test]
    fn test_mysql_unsigned_after_parameters() {
        let schema = parse_sql(
            "CREATE TABLE counters (id INT(11) UNSIGNED NOT NULL AUTO_INCREMENT, hits BIGINT(20) UNSIGNED ZEROFILL, PRIMARY KEY (id));",
            Dialect::Mysql,
        );

        let counters = &schema.tables[0];
        assert_eq!(counters.columns[0].col_type, "INT(11) UNSIGNED");
        assert!(counters.columns[0].primary_key);
        assert_eq!(counters.columns[1].col_type, "BIGINT(20) UNSIGNED ZEROFILL");
    }
}

mod foreign_key_tests {
    use super::*;

    #[test]
    fn test_inline_foreign_key() {
        let schema = pg(r#"
            CREATE TABLE orders (
                id SERIAL PRIMARY KEY,
                user_id INT REFERENCES users(id)
            );
        "#);

        let orders = &schema.tables[0];
        assert_eq!(orders.foreign_keys.len(), 1);
        let fk = &orders.foreign_keys[0];
        assert_eq!(fk.columns, vec!["user_id"]);
        assert_eq!(fk.referenced_table, "users");
        assert_eq!(fk.referenced_columns, vec!["id"]);
        assert!(orders.columns[1].is_foreign_key());
    }

    #[test]
    fn test_inline_qualified_reference_with_constraint() {
        let schema = pg(r#"
            CREATE TABLE billing.invoices (
                account_id INT CONSTRAINT fk_account REFERENCES auth.accounts (account_id) ON DELETE CASCADE
            );
        "#);

        let fk = &schema.tables[0].foreign_keys[0];
        assert_eq!(fk.referenced_table, "auth.accounts");
        assert_eq!(fk.referenced_columns, vec!["account_id"]);
        assert_eq!(fk.name.as_deref(), Some("fk_account"));
    }

    #[test]
    fn test_table_level_foreign_key() {
        let schema = pg(r#"
            CREATE TABLE orders (
                id SERIAL PRIMARY KEY,
                user_id INT,
                FOREIGN KEY (user_id) REFERENCES users(id)
            );
        "#);

        let orders = &schema.tables[0];
        assert_eq!(orders.foreign_keys.len(), 1);
        assert_eq!(orders.foreign_keys[0].referenced_table, "users");
        assert!(orders.get_column("user_id").unwrap().is_foreign_key());
        assert!(!orders.get_column("id").unwrap().is_foreign_key());
    }

    #[test]
    fn test_foreign_key_without_referenced_columns() {
        let schema = pg(r#"
            CREATE TABLE comments (
                post_id INT,
                CONSTRAINT fk_post FOREIGN KEY (post_id) REFERENCES posts
            );
        "#);

        let fk = &schema.tables[0].foreign_keys[0];
        assert_eq!(fk.referenced_table, "posts");
        assert_eq!(fk.referenced_columns, vec!["id"]);
        assert_eq!(fk.name.as_deref(), Some("fk_post"));
    }

    #[test]
    fn test_alter_table_adds_foreign_key() {
        let schema = pg(r#"
            CREATE TABLE users (id INT PRIMARY KEY);
            CREATE TABLE orders (id INT PRIMARY KEY, user_id INT);
            ALTER TABLE ONLY public.orders
                ADD CONSTRAINT orders_user_fk FOREIGN KEY (user_id) REFERENCES public.users(id);
            ALTER TABLE missing ADD CONSTRAINT x FOREIGN KEY (a) REFERENCES users(id);
        "#);

        // public.orders is not declared with a schema, so the qualified ALTER misses it
        assert!(schema.tables[1].foreign_keys.is_empty());

        let schema = pg(r#"
            CREATE TABLE users (id INT PRIMARY KEY);
            CREATE TABLE orders (id INT PRIMARY KEY, user_id INT);
            ALTER TABLE orders
                ADD CONSTRAINT orders_user_fk FOREIGN KEY (user_id) REFERENCES public.users(id);
        "#);
        let orders = &schema.tables[1];
        assert_eq!(orders.foreign_keys.len(), 1);
        assert_eq!(orders.foreign_keys[0].referenced_table, "public.users");
        assert_eq!(orders.foreign_keys[0].name.as_deref(), Some("orders_user_fk"));
        let reference = orders.get_column("user_id").unwrap().references.as_ref().unwrap();
        assert_eq!(reference.schema.as_deref(), Some("public"));
        assert_eq!(reference.table, "users");
    }
}

mod index_tests {
    use super::*;

    #[test]
    fn test_unique_constraint_naming() {
        let schema = pg(r#"
            CREATE TABLE products (
                id SERIAL PRIMARY KEY,
                sku VARCHAR(50),
                upc VARCHAR(50),
                UNIQUE (sku),
                UNIQUE (upc)
            );
        "#);

        let names: Vec<&str> = schema.tables[0]
            .indexes
            .iter()
            .map(|i| i.name.as_str())
            .collect();
        assert_eq!(names.len(), 2);
        assert_ne!(names[0], names[1]);
        assert!(names[0].contains("sku"));
        assert!(names[1].contains("upc"));
        assert!(schema.tables[0].indexes.iter().all(|i| i.unique));
    }

    #[test]
    fn test_create_index() {
        let schema = pg(r#"
            CREATE TABLE shop.orders (id INT, user_id INT, created_at TIMESTAMP);
            CREATE UNIQUE INDEX CONCURRENTLY IF NOT EXISTS idx_orders_user
                ON ONLY shop.orders USING btree (user_id, created_at);
            CREATE INDEX idx_unknown ON nowhere (id);
        "#);

        let indexes = &schema.tables[0].indexes;
        assert_eq!(indexes.len(), 1);
        assert_eq!(indexes[0].name, "idx_orders_user");
        assert_eq!(indexes[0].columns, vec!["user_id", "created_at"]);
        assert!(indexes[0].unique);
    }

    #[test]
    fn test_mysql_inline_index() {
        let schema = parse_sql(
            r#"
            CREATE TABLE `posts` (
              `id` INT NOT NULL AUTO_INCREMENT,
              `author_id` INT NOT NULL,
              PRIMARY KEY (`id`),
              KEY `idx_author` (`author_id`),
              UNIQUE KEY `uq_slug` (`slug`)
            ) ENGINE=InnoDB;
            "#,
            Dialect::Mysql,
        );

        let posts = &schema.tables[0];
        assert_eq!(schema.dialect, Dialect::Mysql);
        assert_eq!(posts.primary_key, Some(vec!["id".to_string()]));
        assert_eq!(posts.indexes.len(), 2);
        assert_eq!(posts.indexes[0].name, "idx_author");
        assert!(!posts.indexes[0].unique);
        assert_eq!(posts.indexes[1].name, "uq_slug");
        assert!(posts.indexes[1].unique);
    }
}

mod statement_tests {
    use super::*;

    #[test]
    fn test_comments_with_semicolons() {
        let schema = pg(r#"
            -- users; the main table
            CREATE TABLE users (
                id INT PRIMARY KEY, /* primary; key */
                bio TEXT DEFAULT 'a;b' -- trailing; comment
            );
            /* CREATE TABLE ghosts (id INT); */
            CREATE TABLE posts (id INT);
        "#);

        assert_eq!(schema.len(), 2);
        assert_eq!(schema.tables[0].columns.len(), 2);
        assert_eq!(schema.tables[0].columns[1].default_value.as_deref(), Some("'a;b'"));
        assert_eq!(schema.tables[1].name, "posts");
    }

    #[test]
    fn test_parse_reader_matches_parse_sql() {
        let sql = "CREATE TABLE a (id INT);\nCREATE TABLE b (a_id INT REFERENCES a(id));\n";
        let from_reader = parse_reader(sql.as_bytes(), Dialect::Postgresql).unwrap();
        assert_eq!(from_reader, pg(sql));
        assert_eq!(from_reader.len(), 2);
    }

    #[test]
    fn test_builder_incremental() {
        let mut builder = SchemaBuilder::new(Dialect::Sqlite);
        assert_eq!(builder.parse_create_table("CREATE TABLE t (id INTEGER)"), Some(0));
        assert_eq!(builder.parse_create_table("CREATE TABLE u (id INTEGER)"), Some(1));
        assert_eq!(builder.parse_create_index("CREATE INDEX i ON u (id)"), Some(1));
        assert_eq!(builder.parse_create_index("CREATE INDEX i ON v (id)"), None);
        assert_eq!(builder.schema().len(), 2);
        assert_eq!(builder.build().dialect, Dialect::Sqlite);
    }

    #[test]
    fn test_split_table_body_respects_nesting() {
        let parts = split_table_body("a NUMERIC(10, 2), b TEXT DEFAULT 'x,y', CHECK (a > 0)");
        assert_eq!(
            parts,
            vec!["a NUMERIC(10, 2)", "b TEXT DEFAULT 'x,y'", "CHECK (a > 0)"]
        );
    }
}
