mod mock;

#[cfg(test)]
mod tests {
    use crate::mock::{BackslashSqlWriter, DollarSqlWriter};
    use indoc::indoc;
    use keel_core::{
        FieldDef, Filter, GenericSqlWriter, Order, Schema, SchemaError, SqlWriter, Value,
    };

    fn user() -> Schema {
        Schema::builder("User")
            .table("users")
            .field(FieldDef::string("id").ddl("varchar(50)").primary_key())
            .field(FieldDef::string("email").ddl("varchar(50)"))
            .field(FieldDef::string("passwd").ddl("varchar(50)"))
            .field(FieldDef::boolean("admin"))
            .field(FieldDef::string("name").ddl("varchar(50)"))
            .field(FieldDef::string("image").ddl("varchar(500)"))
            .field(FieldDef::float("created_at"))
            .build()
            .unwrap()
    }

    #[test]
    fn templates() {
        let schema = user();
        assert_eq!(
            schema.select_sql(),
            "SELECT `id`, `email`, `passwd`, `admin`, `name`, `image`, `created_at` FROM `users`"
        );
        assert_eq!(schema.select_count_sql(), "SELECT COUNT(`id`) FROM `users`");
        assert_eq!(
            schema.insert_sql(),
            "INSERT INTO `users` (`email`, `passwd`, `admin`, `name`, `image`, `created_at`, `id`) VALUES (?, ?, ?, ?, ?, ?, ?)"
        );
        assert_eq!(
            schema.update_sql(),
            "UPDATE `users` SET `email`=?, `passwd`=?, `admin`=?, `name`=?, `image`=?, `created_at`=? WHERE `id`=?"
        );
        assert_eq!(schema.delete_sql(), "DELETE FROM `users` WHERE `id`=?");
    }

    #[test]
    fn primary_key_not_first() {
        let schema = Schema::builder("Comment")
            .table("comments")
            .field(FieldDef::string("blog_id"))
            .field(FieldDef::text("content"))
            .field(FieldDef::integer("number").primary_key())
            .build()
            .unwrap();
        assert_eq!(
            schema.select_sql(),
            "SELECT `number`, `blog_id`, `content` FROM `comments`"
        );
        assert_eq!(
            schema.insert_sql(),
            "INSERT INTO `comments` (`blog_id`, `content`, `number`) VALUES (?, ?, ?)"
        );
        assert_eq!(
            schema.update_sql(),
            "UPDATE `comments` SET `blog_id`=?, `content`=? WHERE `number`=?"
        );
    }

    #[test]
    fn only_primary_key() {
        let schema = Schema::builder("Tag")
            .field(FieldDef::string("label").primary_key())
            .build()
            .unwrap();
        assert_eq!(schema.table_name(), "Tag");
        assert_eq!(schema.select_sql(), "SELECT `label` FROM `Tag`");
        assert_eq!(schema.insert_sql(), "INSERT INTO `Tag` (`label`) VALUES (?)");
        assert_eq!(
            schema.update_sql(),
            "UPDATE `Tag` SET `label`=`label` WHERE `label`=?"
        );
    }

    #[test]
    fn quoted_identifiers() {
        let schema = Schema::builder("Odd")
            .table("odd`table")
            .field(FieldDef::integer("select").primary_key())
            .build()
            .unwrap();
        assert_eq!(schema.delete_sql(), "DELETE FROM `odd``table` WHERE `select`=?");
    }

    #[test]
    fn create_table() {
        let schema = user();
        assert_eq!(
            schema.create_table_sql(true),
            indoc! {"
                CREATE TABLE IF NOT EXISTS `users` (
                    `id` varchar(50) NOT NULL PRIMARY KEY,
                    `email` varchar(50),
                    `passwd` varchar(50),
                    `admin` boolean,
                    `name` varchar(50),
                    `image` varchar(500),
                    `created_at` real
                )"}
        );
        assert_eq!(schema.drop_table_sql(true), "DROP TABLE IF EXISTS `users`");
        assert_eq!(schema.drop_table_sql(false), "DROP TABLE `users`");
    }

    #[test]
    fn filters() {
        let schema = user();
        let (sql, args) = schema.select_filtered(&Filter::new()).unwrap();
        assert_eq!(sql, schema.select_sql());
        assert!(args.is_empty());

        let filter = Filter::new()
            .eq("admin", true)
            .eq("name", "Test")
            .order_by("created_at", Order::Desc)
            .order_by("email", Order::Asc)
            .limit(10)
            .offset(20);
        let (sql, args) = schema.select_filtered(&filter).unwrap();
        assert_eq!(
            sql,
            "SELECT `id`, `email`, `passwd`, `admin`, `name`, `image`, `created_at` FROM `users` WHERE `admin`=? AND `name`=? ORDER BY `created_at` DESC, `email` LIMIT ? OFFSET ?"
        );
        assert_eq!(
            args,
            [
                Value::Boolean(Some(true)),
                Value::Varchar(Some("Test".into())),
                Value::Int64(Some(10)),
                Value::Int64(Some(20)),
            ]
        );

        let (sql, args) = schema.count_filtered(&filter).unwrap();
        assert_eq!(
            sql,
            "SELECT COUNT(`id`) FROM `users` WHERE `admin`=? AND `name`=?"
        );
        assert_eq!(args.len(), 2);
    }

    #[test]
    fn filter_null_and_offset() {
        let schema = user();
        let (sql, args) = schema
            .select_filtered(&Filter::new().eq("image", Value::Null).offset(5))
            .unwrap();
        assert!(sql.ends_with("FROM `users` WHERE `image` IS NULL"), "{sql}");
        assert!(args.is_empty());
    }

    #[test]
    fn filter_limit_clamped() {
        let schema = user();
        let (_, args) = schema
            .select_filtered(&Filter::new().limit(u64::MAX).offset(1 << 63))
            .unwrap();
        assert_eq!(
            args,
            [Value::Int64(Some(i64::MAX)), Value::Int64(Some(i64::MAX))]
        );
    }

    #[test]
    fn filter_unknown_column() {
        let schema = user();
        let error = schema
            .select_filtered(&Filter::new().order_by("age", Order::Asc))
            .unwrap_err();
        assert_eq!(
            error,
            SchemaError::UnknownAttribute {
                entity: "User".into(),
                attribute: "age".into(),
            }
        );
    }

    #[test]
    fn placeholders() {
        let writer = GenericSqlWriter;
        let (sql, count) = writer.rewrite_placeholders("SELECT * FROM `t` WHERE `a`=? AND `b`=?");
        assert_eq!(sql, "SELECT * FROM `t` WHERE `a`=? AND `b`=?");
        assert_eq!(count, 2);

        let writer = DollarSqlWriter;
        let (sql, count) = writer.rewrite_placeholders(
            r#"UPDATE "t" SET "a"=?, "b"='it''s ?', "c"='C:\' WHERE "x?"=?"#,
        );
        assert_eq!(
            sql,
            r#"UPDATE "t" SET "a"=$1, "b"='it''s ?', "c"='C:\' WHERE "x?"=$2"#
        );
        assert_eq!(count, 2);
        let (_, count) = writer.rewrite_placeholders("SELECT 1");
        assert_eq!(count, 0);
    }

    #[test]
    fn placeholders_backslash_escapes() {
        // The backslash is an ordinary character, the quote after it ends the literal
        let (sql, count) =
            GenericSqlWriter.rewrite_placeholders(r#"SELECT 'C:\' AS p, ? AS q, "D:\", ?"#);
        assert_eq!(sql, r#"SELECT 'C:\' AS p, ? AS q, "D:\", ?"#);
        assert_eq!(count, 2);

        let (sql, count) = BackslashSqlWriter.rewrite_placeholders(
            r#"SELECT 'it\'s ?' AS r, ? AS q, "say \"?\"", `a\`, ?"#,
        );
        assert_eq!(sql, r#"SELECT 'it\'s ?' AS r, $1 AS q, "say \"?\"", `a\`, $2"#);
        assert_eq!(count, 2);
        let (_, count) = BackslashSqlWriter.rewrite_placeholders(r"SELECT 'C:\\', ?");
        assert_eq!(count, 1);
    }

    #[test]
    fn numbered_writer_schema() {
        static WRITER: DollarSqlWriter = DollarSqlWriter;
        let schema = Schema::builder("Blog")
            .table("blogs")
            .writer(&WRITER)
            .field(FieldDef::string("id").primary_key())
            .field(FieldDef::string("name"))
            .build()
            .unwrap();
        assert_eq!(
            schema.update_sql(),
            r#"UPDATE "blogs" SET "name"=? WHERE "id"=?"#
        );
        let (sql, _) = WRITER.rewrite_placeholders(schema.update_sql());
        assert_eq!(sql, r#"UPDATE "blogs" SET "name"=$1 WHERE "id"=$2"#);
    }
}
