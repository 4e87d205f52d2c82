use tracing::{error, trace};

use crate::error::MalformedRow;
use crate::snmp::{RowSource, VarBind};

/// Обработчик строки обхода: дописывает метрики в аккумулятор.
///
/// Ошибка возвращается только для некорректной строки и прерывает обход.
pub trait RowHandler<A>: Send + Sync {
    fn handle(&self, index: usize, bindings: &[VarBind], acc: &mut A) -> Result<(), MalformedRow>;
}

impl<A, F> RowHandler<A> for F
where
    F: Fn(usize, &[VarBind], &mut A) -> Result<(), MalformedRow> + Send + Sync,
{
    fn handle(&self, index: usize, bindings: &[VarBind], acc: &mut A) -> Result<(), MalformedRow> {
        self(index, bindings, acc)
    }
}

/// Обработчик по умолчанию: печатает "oid = value" для диагностики
#[derive(Debug, Clone, Copy, Default)]
pub struct PrintRows;

impl<A> RowHandler<A> for PrintRows {
    fn handle(&self, _index: usize, bindings: &[VarBind], _acc: &mut A) -> Result<(), MalformedRow> {
        for vb in bindings {
            println!("{}", vb);
        }
        Ok(())
    }
}

/// Прогоняет все строки обхода через обработчик.
///
/// Строки с ошибкой транспорта или протокола логируются и пропускаются,
/// уже накопленные метрики не теряются. Номер строки считается с 1
/// и учитывает пропущенные строки.
pub async fn process_metrics<R, A, H>(rows: &mut R, handler: &H) -> Result<A, MalformedRow>
where
    R: RowSource,
    A: Default + Send,
    H: RowHandler<A> + ?Sized,
{
    let mut acc = A::default();
    let mut index = 0usize;

    while let Some(row) = rows.next_row().await {
        index += 1;

        if let Some(indication) = &row.error_indication {
            error!("{}", indication);
            continue;
        }
        if let Some(status) = &row.error_status
            && status.code != 0
        {
            error!("{} at {}", status, status.offending_oid(&row.bindings));
            continue;
        }

        trace!(index, bindings = row.bindings.len(), "строка обхода");
        handler.handle(index, &row.bindings, &mut acc)?;
    }

    Ok(acc)
}

/// process_metrics с обработчиком по умолчанию
pub async fn print_metrics<R>(rows: &mut R) -> Result<(), MalformedRow>
where
    R: RowSource,
{
    process_metrics::<R, (), PrintRows>(rows, &PrintRows).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::types::{MetricRecord, MetricsResult};
    use crate::snmp::{ErrorStatus, ResponseRow, SnmpValue, parse_oid};

    fn load_row(value: i64) -> ResponseRow {
        ResponseRow::values(vec![VarBind::new(
            parse_oid("1.3.6.1.2.1.25.3.3.1.2.1").unwrap(),
            SnmpValue::Integer(value),
        )])
    }

    fn count_rows(index: usize, bindings: &[VarBind], acc: &mut MetricsResult) -> Result<(), MalformedRow> {
        let value = bindings[0].value.as_f64().unwrap_or_default();
        acc.push("seen", MetricRecord::absolute(value, "Index", index.to_string()));
        Ok(())
    }

    #[tokio::test]
    async fn skips_error_rows_and_keeps_going() {
        let mut rows = vec![
            ResponseRow::transport_error("requestTimedOut"),
            load_row(10),
            ResponseRow::protocol_error(ErrorStatus { code: 5, index: 1 }, vec![]),
            load_row(20),
        ]
        .into_iter();

        let metrics: MetricsResult = process_metrics(&mut rows, &count_rows).await.unwrap();

        let seen = metrics.get("seen");
        assert_eq!(seen.len(), 2);
        // Индексы учитывают пропущенные строки
        assert_eq!(seen[0].dimension["Index"], "2");
        assert_eq!(seen[1].dimension["Index"], "4");
    }

    #[tokio::test]
    async fn zero_error_status_is_not_an_error() {
        let mut row = load_row(7);
        row.error_status = Some(ErrorStatus { code: 0, index: 0 });
        let mut rows = vec![row].into_iter();

        let metrics: MetricsResult = process_metrics(&mut rows, &count_rows).await.unwrap();
        assert_eq!(metrics.get("seen").len(), 1);
    }

    #[tokio::test]
    async fn handler_error_aborts_walk() {
        let mut rows = vec![load_row(1), load_row(2), load_row(3)].into_iter();
        let fail_on_second = |index: usize, _: &[VarBind], acc: &mut Vec<usize>| {
            if index == 2 {
                return Err(MalformedRow::new(index, "1 binding", "0"));
            }
            acc.push(index);
            Ok(())
        };

        let result = process_metrics(&mut rows, &fail_on_second).await;
        assert_eq!(result, Err(MalformedRow::new(2, "1 binding", "0")));
        // Третья строка не запрашивалась
        assert_eq!(rows.len(), 1);
    }

    #[tokio::test]
    async fn empty_walk_gives_empty_result() {
        let mut rows = Vec::<ResponseRow>::new().into_iter();
        let metrics: MetricsResult = process_metrics(&mut rows, &count_rows).await.unwrap();
        assert!(metrics.is_empty());
    }

    #[tokio::test]
    async fn print_rows_accepts_anything() {
        let mut rows = vec![load_row(1), ResponseRow::transport_error("timeout")].into_iter();
        assert!(print_metrics(&mut rows).await.is_ok());
    }
}
