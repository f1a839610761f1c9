/// Implements [Table](crate::database::Table) for a model.
///
/// ```ignore
/// define_table!("videos": Video);
/// ```
#[macro_export]
macro_rules! define_table {
    ($table:literal: $model:ty) => {
        impl $crate::database::Table for $model {
            fn table() -> &'static str {
                $table
            }
        }
    };
}

/// Defines a method to query the database using SQL.
///
/// # Syntax
/// ```ignore
/// [Base Type] > method_name(...arguments) > [Output Type] where "sql query"
/// ```
/// Where the `Base Type` is the type that the method is being defined for and the `Output Type` is the type that the method will return.
/// Every argument is bound to the query under its own name, the database handle is always the last parameter.
///
/// # Example
///
/// ```ignore
/// define_relation! {
///     ViewEvent > for_video(video: &Record<Video>) > Vec<ViewEvent>
///         where "SELECT * FROM view_events WHERE video = $video ORDER BY created_at DESC"
/// }
///
/// let events = ViewEvent::for_video(&video_id, &db).await?;
/// ```
#[macro_export]
macro_rules! define_relation {
    ($model:ty > $relation:ident ($($binding:ident : $binding_type:ty),*) > $export:ty where $query:literal) => {
        impl $model {
            #[tracing::instrument(skip(db))]
            pub async fn $relation(
                $($binding : $binding_type ,)* db: &$crate::database::Database,
            ) -> ::std::result::Result<$export, $crate::database::DatabaseQueryError> {
                use $crate::database::Sql as _;
                db.sql($query)
                    $(.bind((stringify!($binding), $binding)))*
                    .fetch_first()
                    .await
            }
        }
    };
}
