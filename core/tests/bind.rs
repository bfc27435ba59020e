use loam_core::{
    Binder, CancelToken, Entity, EntityConfigurator, FieldSpec, LoamError, Model, ResultSet,
    Schema, SlotEntry, Slots, Value, SQLITE,
};

#[derive(Debug, Default, PartialEq)]
struct User {
    id: i64,
    name: String,
    age: i64,
}

impl Model for User {
    fn fields(out: &mut Vec<FieldSpec>) {
        out.push(FieldSpec {
            ident: "id",
            column: "id",
            primary_key: true,
            is_virtual: false,
            type_name: "i64",
        });
        out.push(FieldSpec {
            ident: "name",
            column: "name",
            primary_key: false,
            is_virtual: false,
            type_name: "String",
        });
        out.push(FieldSpec {
            ident: "age",
            column: "age",
            primary_key: false,
            is_virtual: false,
            type_name: "i64",
        });
    }

    fn collect<'a>(&'a mut self, slots: &mut Slots<'a>) {
        slots.push(SlotEntry {
            ident: "id",
            column: "id",
            sink: &mut self.id,
        });
        slots.push(SlotEntry {
            ident: "name",
            column: "name",
            sink: &mut self.name,
        });
        slots.push(SlotEntry {
            ident: "age",
            column: "age",
            sink: &mut self.age,
        });
    }

    fn values(&self, out: &mut Vec<(&'static str, Value)>) {
        out.push(("id", Value::Int(self.id)));
        out.push(("name", Value::Text(self.name.clone())));
        out.push(("age", Value::Int(self.age)));
    }
}

impl Entity for User {
    fn configure(c: &mut EntityConfigurator) {
        c.table("users")
            .fields()
            .field("name")
            .column_name("full_name");
    }
}

// Address flattens into Home's slot list the way an embedded struct does.
#[derive(Debug, Default, PartialEq)]
struct Address {
    street: String,
    zip: String,
}

impl Model for Address {
    fn fields(out: &mut Vec<FieldSpec>) {
        out.push(FieldSpec {
            ident: "street",
            column: "street",
            primary_key: false,
            is_virtual: false,
            type_name: "String",
        });
        out.push(FieldSpec {
            ident: "zip",
            column: "zip",
            primary_key: false,
            is_virtual: false,
            type_name: "String",
        });
    }

    fn collect<'a>(&'a mut self, slots: &mut Slots<'a>) {
        slots.push(SlotEntry {
            ident: "street",
            column: "street",
            sink: &mut self.street,
        });
        slots.push(SlotEntry {
            ident: "zip",
            column: "zip",
            sink: &mut self.zip,
        });
    }

    fn values(&self, out: &mut Vec<(&'static str, Value)>) {
        out.push(("street", Value::Text(self.street.clone())));
        out.push(("zip", Value::Text(self.zip.clone())));
    }
}

#[derive(Debug, Default, PartialEq)]
struct Home {
    id: i64,
    address: Address,
}

impl Model for Home {
    fn fields(out: &mut Vec<FieldSpec>) {
        out.push(FieldSpec {
            ident: "id",
            column: "id",
            primary_key: true,
            is_virtual: false,
            type_name: "i64",
        });
        out.push(FieldSpec {
            ident: "address",
            column: "address",
            primary_key: false,
            is_virtual: true,
            type_name: "Address",
        });
    }

    fn collect<'a>(&'a mut self, slots: &mut Slots<'a>) {
        slots.push(SlotEntry {
            ident: "id",
            column: "id",
            sink: &mut self.id,
        });
        self.address.collect(slots);
    }

    fn values(&self, out: &mut Vec<(&'static str, Value)>) {
        out.push(("id", Value::Int(self.id)));
    }
}

// Reusable timestamp group, flattened into any entity that embeds it.
#[derive(Debug, Default, PartialEq)]
struct Timestamps {
    created_at: String,
    updated_at: String,
    deleted_at: Option<String>,
}

impl Model for Timestamps {
    fn fields(out: &mut Vec<FieldSpec>) {
        out.push(FieldSpec {
            ident: "created_at",
            column: "created_at",
            primary_key: false,
            is_virtual: false,
            type_name: "String",
        });
        out.push(FieldSpec {
            ident: "updated_at",
            column: "updated_at",
            primary_key: false,
            is_virtual: false,
            type_name: "String",
        });
        out.push(FieldSpec {
            ident: "deleted_at",
            column: "deleted_at",
            primary_key: false,
            is_virtual: false,
            type_name: "Option<String>",
        });
    }

    fn collect<'a>(&'a mut self, slots: &mut Slots<'a>) {
        slots.push(SlotEntry {
            ident: "created_at",
            column: "created_at",
            sink: &mut self.created_at,
        });
        slots.push(SlotEntry {
            ident: "updated_at",
            column: "updated_at",
            sink: &mut self.updated_at,
        });
        slots.push(SlotEntry {
            ident: "deleted_at",
            column: "deleted_at",
            sink: &mut self.deleted_at,
        });
    }

    fn values(&self, out: &mut Vec<(&'static str, Value)>) {
        out.push(("created_at", Value::Text(self.created_at.clone())));
        out.push(("updated_at", Value::Text(self.updated_at.clone())));
        out.push((
            "deleted_at",
            match &self.deleted_at {
                Some(s) => Value::Text(s.clone()),
                None => Value::Null,
            },
        ));
    }
}

#[derive(Debug, Default, PartialEq)]
struct Stamped {
    id: i64,
    name: String,
    timestamps: Timestamps,
}

impl Model for Stamped {
    fn fields(out: &mut Vec<FieldSpec>) {
        out.push(FieldSpec {
            ident: "id",
            column: "id",
            primary_key: true,
            is_virtual: false,
            type_name: "i64",
        });
        out.push(FieldSpec {
            ident: "name",
            column: "name",
            primary_key: false,
            is_virtual: false,
            type_name: "String",
        });
        out.push(FieldSpec {
            ident: "timestamps",
            column: "timestamps",
            primary_key: false,
            is_virtual: true,
            type_name: "Timestamps",
        });
    }

    fn collect<'a>(&'a mut self, slots: &mut Slots<'a>) {
        slots.push(SlotEntry {
            ident: "id",
            column: "id",
            sink: &mut self.id,
        });
        slots.push(SlotEntry {
            ident: "name",
            column: "name",
            sink: &mut self.name,
        });
        self.timestamps.collect(slots);
    }

    fn values(&self, out: &mut Vec<(&'static str, Value)>) {
        out.push(("id", Value::Int(self.id)));
        out.push(("name", Value::Text(self.name.clone())));
    }
}

fn user_rows() -> ResultSet {
    ResultSet {
        columns: vec!["id".into(), "name".into(), "age".into()],
        rows: vec![
            vec![Value::Int(1), Value::Text("amirreza".into()), Value::Int(30)],
            vec![Value::Int(2), Value::Text("parsa".into()), Value::Int(26)],
        ],
    }
}

#[test]
fn bind_many_fills_every_row() {
    let users: Vec<User> = Binder::schemaless().bind_many(&user_rows()).unwrap();
    assert_eq!(users.len(), 2);
    assert_eq!(
        users[0],
        User {
            id: 1,
            name: "amirreza".into(),
            age: 30,
        }
    );
    assert_eq!(users[1].name, "parsa");
}

#[test]
fn unclaimed_columns_are_discarded() {
    let rows = ResultSet {
        columns: vec!["id".into(), "shoe_size".into()],
        rows: vec![vec![Value::Int(7), Value::Int(44)]],
    };
    let users: Vec<User> = Binder::schemaless().bind_many(&rows).unwrap();
    assert_eq!(users[0].id, 7);
    // uncovered fields keep their defaults
    assert_eq!(users[0].name, "");
    assert_eq!(users[0].age, 0);
}

#[test]
fn bind_one_on_empty_result_is_not_found() {
    let rows = ResultSet {
        columns: vec!["id".into()],
        rows: vec![],
    };
    let mut user = User::default();
    let err = Binder::schemaless().bind_one(&rows, &mut user).unwrap_err();
    assert!(matches!(err, LoamError::NotFound));
}

#[test]
fn scan_mismatch_names_the_column() {
    let rows = ResultSet {
        columns: vec!["age".into()],
        rows: vec![vec![Value::Text("old".into())]],
    };
    let err = Binder::schemaless()
        .bind_many::<User>(&rows)
        .unwrap_err();
    match err {
        LoamError::Scan { column, .. } => assert_eq!(column, "age"),
        other => panic!("expected scan error, got {other:?}"),
    }
}

#[test]
fn null_into_scalar_is_a_scan_error() {
    let rows = ResultSet {
        columns: vec!["name".into()],
        rows: vec![vec![Value::Null]],
    };
    let err = Binder::schemaless()
        .bind_many::<User>(&rows)
        .unwrap_err();
    assert!(matches!(err, LoamError::Scan { .. }));
}

#[test]
fn schema_renamed_column_binds_through_ident() {
    let schema = Schema::build::<User>(&SQLITE).unwrap();
    let rows = ResultSet {
        columns: vec!["id".into(), "full_name".into()],
        rows: vec![vec![Value::Int(3), Value::Text("mahsa".into())]],
    };
    let users: Vec<User> = Binder::new(&schema).bind_many(&rows).unwrap();
    assert_eq!(users[0].name, "mahsa");
}

#[test]
fn embedded_fields_bind_from_flat_columns() {
    let rows = ResultSet {
        columns: vec!["id".into(), "street".into(), "zip".into()],
        rows: vec![vec![
            Value::Int(9),
            Value::Text("main st".into()),
            Value::Text("90210".into()),
        ]],
    };
    let homes: Vec<Home> = Binder::schemaless().bind_many(&rows).unwrap();
    assert_eq!(
        homes[0],
        Home {
            id: 9,
            address: Address {
                street: "main st".into(),
                zip: "90210".into(),
            },
        }
    );
}

#[test]
fn nested_timestamp_group_scans_with_null_option() {
    let rows = ResultSet {
        columns: vec![
            "id".into(),
            "name".into(),
            "created_at".into(),
            "updated_at".into(),
            "deleted_at".into(),
        ],
        rows: vec![vec![
            Value::Int(1),
            Value::Text("amirreza".into()),
            Value::Text("2022-01-01 10:00:00".into()),
            Value::Text("2022-01-02 10:00:00".into()),
            Value::Null,
        ]],
    };
    let mut user = Stamped::default();
    Binder::schemaless().bind_one(&rows, &mut user).unwrap();
    assert_eq!(user.name, "amirreza");
    assert_eq!(user.timestamps.created_at, "2022-01-01 10:00:00");
    assert_eq!(user.timestamps.updated_at, "2022-01-02 10:00:00");
    assert_eq!(user.timestamps.deleted_at, None);
}

#[test]
fn canceled_token_stops_binding() {
    let cancel = CancelToken::new();
    cancel.cancel();
    let err = Binder::schemaless()
        .with_cancel(cancel)
        .bind_many::<User>(&user_rows())
        .unwrap_err();
    assert!(matches!(err, LoamError::Canceled));
}

#[test]
fn row_width_mismatch_is_a_bind_error() {
    let rows = ResultSet {
        columns: vec!["id".into(), "name".into()],
        rows: vec![vec![Value::Int(1)]],
    };
    let err = Binder::schemaless()
        .bind_many::<User>(&rows)
        .unwrap_err();
    assert!(matches!(err, LoamError::Bind(_)));
}
